use clap::Parser;
use std::path::PathBuf;

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" sql-query-runner"#;
const EX2: &str = r#" sql-query-runner --table orders --dark"#;
const EX3: &str = r#" sql-query-runner --storage-dir /tmp/sqr-state --delay-ms 0"#;

/// Command-line arguments for the SQL Query Runner application.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}")
)]
pub struct Arguments {
    /// Table selected at startup. [Default: first table in the catalog]
    #[arg(
        short = 't',
        long,
        value_name = "TABLE_NAME",
        help = "Table selected at startup (customers, orders, products, employees, large_dataset)",
        long_help = "Selects the initial table.\n\
        Unknown names fall back to the first table in the catalog."
    )]
    pub table: Option<String>,

    /// Simulated execution latency in milliseconds. [Default: 500]
    #[arg(
        short = 'd',
        long,
        value_name = "MILLIS",
        default_value_t = 500,
        help = "Simulated execution latency in milliseconds",
        long_help = "Every run waits this long before the result set appears.\n\
        Use 0 to make executions effectively instantaneous (handy for demos and tests)."
    )]
    pub delay_ms: u64,

    /// Directory holding persisted state (theme, saved and recent queries).
    #[arg(
        short = 's',
        long,
        value_name = "DIR",
        help = "Directory for persisted state [Default: platform config dir]",
        long_help = "Overrides the persistence directory.\n\
        By default state lives under the platform config directory\n\
        (e.g. ~/.config/sql-query-runner on Linux)."
    )]
    pub storage_dir: Option<PathBuf>,

    /// Start in dark mode, overriding the persisted theme.
    #[arg(
        long,
        help = "Start in dark mode, overriding the persisted theme",
        action = clap::ArgAction::SetTrue
    )]
    pub dark: bool,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_args`
#[cfg(test)]
mod tests_args {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Arguments::parse_from(["sql-query-runner"]);

        assert_eq!(args.table, None);
        assert_eq!(args.delay_ms, 500);
        assert_eq!(args.storage_dir, None);
        assert!(!args.dark);
    }

    #[test]
    fn test_args_all_options_short() {
        let args = Arguments::parse_from([
            "sql-query-runner",
            "-t",
            "orders",
            "-d",
            "0",
            "-s",
            "/tmp/sqr-state",
        ]);

        assert_eq!(args.table, Some("orders".to_string()));
        assert_eq!(args.delay_ms, 0);
        assert_eq!(args.storage_dir, Some(PathBuf::from("/tmp/sqr-state")));
        assert!(!args.dark);
    }

    #[test]
    fn test_args_all_options_long() {
        let args = Arguments::parse_from([
            "sql-query-runner",
            "--table",
            "large_dataset",
            "--delay-ms",
            "250",
            "--storage-dir",
            "/var/tmp/state",
            "--dark",
        ]);

        assert_eq!(args.table, Some("large_dataset".to_string()));
        assert_eq!(args.delay_ms, 250);
        assert_eq!(args.storage_dir, Some(PathBuf::from("/var/tmp/state")));
        assert!(args.dark);
    }
}
