use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;

use crate::data_fetcher::models::{LoadOptions, SortOrder};

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// MX Bikes community data client
///
/// Loads tracks, mods, downloads, races, rankings and rider profiles from
/// the community site's public and internal APIs, falling back to static
/// data when a source is down. Results are printed as normalized JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    /// Content type to load: tracks, mods, downloads, races, rankings or riders
    #[arg(long = "type", short = 't', default_value = "tracks", help_heading = "Query")]
    pub content_type: String,

    /// Only return items whose name, description or creator contains this text
    #[arg(long, short = 's', help_heading = "Query")]
    pub search: Option<String>,

    /// Only return items in this category, e.g. Motocross
    #[arg(long, short = 'c', help_heading = "Query")]
    pub category: Option<String>,

    /// Result page to request
    #[arg(long, help_heading = "Query")]
    pub page: Option<u32>,

    /// Sort order: popular, newest, downloads or rating
    #[arg(long, value_parser = parse_sort, help_heading = "Query")]
    pub sort: Option<SortOrder>,

    /// Request premium content (needs premium access in the config)
    #[arg(long, help_heading = "Query")]
    pub premium: bool,

    /// Load a single race; routes to the race's dedicated port
    #[arg(long = "race-id", help_heading = "Query")]
    pub race_id: Option<String>,

    /// Load a single record by id, e.g. a rider profile
    #[arg(long, help_heading = "Query")]
    pub id: Option<String>,

    /// Probe source health and exit
    #[arg(long, help_heading = "Diagnostics")]
    pub health: bool,

    /// Print request statistics after loading
    #[arg(long, help_heading = "Diagnostics")]
    pub stats: bool,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,

    /// Also write logs to stdout
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Debug")]
    pub log_file: Option<String>,
}

fn parse_sort(value: &str) -> Result<SortOrder, String> {
    value.parse()
}

impl Args {
    /// Load options described by the query flags
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            search: self.search.clone(),
            category: self.category.clone(),
            page: self.page,
            sort: self.sort,
            premium: self.premium,
            race_id: self.race_id.clone(),
            id: self.id.clone(),
            ..LoadOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mxbikes_data"]);
        assert_eq!(args.content_type, "tracks");
        assert!(!args.health);
        assert_eq!(args.load_options(), LoadOptions::default());
    }

    #[test]
    fn test_query_flags_map_to_options() {
        let args = Args::parse_from([
            "mxbikes_data",
            "--type",
            "races",
            "--race-id",
            "42",
            "--sort",
            "newest",
            "--page",
            "2",
            "--premium",
        ]);
        let options = args.load_options();
        assert_eq!(args.content_type, "races");
        assert_eq!(options.race_id.as_deref(), Some("42"));
        assert_eq!(options.sort, Some(SortOrder::Newest));
        assert_eq!(options.page, Some(2));
        assert!(options.premium);
    }

    #[test]
    fn test_rejects_unknown_sort() {
        assert!(Args::try_parse_from(["mxbikes_data", "--sort", "sideways"]).is_err());
    }
}
