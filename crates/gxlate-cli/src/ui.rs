// Macros for user-facing output. Results go to stdout, notes to stderr.

use gxlate_domain::Failure;

#[macro_export]
macro_rules! ui_ok {
    ($($arg:tt)*) => {{
        println!("✔ {}", format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_info {
    ($($arg:tt)*) => {{
        eprintln!("ℹ {}", format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_warn {
    ($($arg:tt)*) => {{
        use std::io::IsTerminal;
        let show_icon = std::io::stderr().is_terminal() && std::env::var_os("NO_ICONS").is_none();
        if show_icon {
            eprintln!("⚠ {}", format_args!($($arg)*));
        } else {
            eprintln!("{}", format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! ui_err {
    ($($arg:tt)*) => {{
        eprintln!("✖ {}", format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_out {
    ($($arg:tt)*) => {{
        println!("{}", format_args!($($arg)*));
    }};
}

/// A warning header, then one line per failure, all on stderr.
pub fn print_failures(failures: &[Failure], use_color: bool) {
    if failures.is_empty() {
        return;
    }
    crate::ui_warn!("{} operation(s) failed:", failures.len());
    for f in failures {
        if use_color {
            use owo_colors::OwoColorize;
            let key = f.key.as_deref().map(|k| format!(" [{}]", k.green())).unwrap_or_default();
            eprintln!("✖ {}{}: {}", f.scope.blue(), key, f.message.red());
        } else {
            crate::ui_err!("{f}");
        }
    }
}
