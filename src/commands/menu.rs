//! Interactive selection of what to migrate

use anyhow::Result;
use chrome_profile_migrate::config::{MigrationItem, MigrationOptions};
use owo_colors::OwoColorize;

use super::utils;

/// A parsed menu answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuInput {
    /// Empty line: keep the current selection
    Accept,
    All,
    None,
    /// 1-based item numbers to flip
    Toggle(Vec<usize>),
}

/// Parse one line of menu input
///
/// Numbers may be separated by spaces and/or commas.
pub fn parse_menu_input(input: &str) -> Option<MenuInput> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "" => Some(MenuInput::Accept),
        "all" => Some(MenuInput::All),
        "none" => Some(MenuInput::None),
        _ => input
            .replace(',', " ")
            .split_whitespace()
            .map(|n| n.parse().ok())
            .collect::<Option<Vec<usize>>>()
            .map(MenuInput::Toggle),
    }
}

/// Apply a menu answer; returns the numbers that were out of range
pub fn apply_menu_input(options: &mut MigrationOptions, input: &MenuInput) -> Vec<usize> {
    let mut invalid = Vec::new();
    match input {
        MenuInput::Accept => {}
        MenuInput::All => options.set_all(true),
        MenuInput::None => options.set_all(false),
        MenuInput::Toggle(numbers) => {
            for &number in numbers {
                match number.checked_sub(1).and_then(|i| MigrationItem::ALL.get(i)) {
                    Some(&item) => options.toggle(item),
                    None => invalid.push(number),
                }
            }
        }
    }
    invalid
}

/// Show the menu until the user accepts the selection
pub fn run_menu(options: &mut MigrationOptions) -> Result<()> {
    loop {
        print_menu(options);

        let answer = utils::prompt_line("\nYour choice: ")?;
        let Some(input) = parse_menu_input(&answer) else {
            println!("Invalid input. Please enter numbers, 'all', 'none', or press Enter.");
            continue;
        };

        if input == MenuInput::Accept {
            return Ok(());
        }

        for number in apply_menu_input(options, &input) {
            println!("{} {}", "Invalid number:".yellow(), number);
        }
    }
}

fn print_menu(options: &MigrationOptions) {
    println!();
    println!("{}", "Select what to migrate (current selection shown):".green());

    for (i, item) in MigrationItem::ALL.iter().enumerate() {
        let status = if options.get(*item) { "[X]" } else { "[ ]" };
        println!("{}. {} {}", i + 1, status, item.description());
    }

    println!();
    println!("  - Enter numbers to toggle (e.g. '1 3 5' or '1,3,5')");
    println!("  - Press Enter to accept the current selection");
    println!("  - Type 'all' to select everything, 'none' to deselect everything");
}
