use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Whether stdout gets ANSI colour.
pub fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

pub fn section(title: &str) {
    println!();
    if use_color() {
        println!("{}", title.bold());
    } else {
        println!("{title}");
    }
}

pub fn success(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    if use_color() {
        println!("  {} {}", "\u{2713}".green(), msg);
    } else {
        println!("  \u{2713} {msg}");
    }
}

pub fn warning(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    if use_color() {
        println!("  {} {}", "!".yellow().bold(), msg.yellow());
    } else {
        println!("  ! {msg}");
    }
}

pub fn failure(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    if use_color() {
        println!("  {} {}", "\u{2717}".red().bold(), msg.red());
    } else {
        println!("  \u{2717} {msg}");
    }
}

pub fn note(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    if use_color() {
        println!("    {}", msg.dimmed());
    } else {
        println!("    {msg}");
    }
}

/// Highlighted line for content the operator is about to lose.
pub fn danger(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    if use_color() {
        println!("  {}", msg.red().bold());
    } else {
        println!("  {msg}");
    }
}
