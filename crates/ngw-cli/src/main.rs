//! NG word filter CLI
//!
//! Runs the filter offline against saved search result pages and edits
//! block-list files.

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};

use ngw_core::adapters::select_adapters;
use ngw_core::document::{Document, NodeId};
use ngw_core::list::{append_entry, dedupe_lines, format_entry, remove_entry};
use ngw_core::{Dom, FilterSession, NoopNotifier, PageContext, RuleOptions, RuleSet, StoredConfig, Tuning};

#[derive(Parser)]
#[command(name = "ngw-cli")]
#[command(about = "NG word search result filter tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one filter pass over a saved result page
    Filter {
        /// Saved HTML page
        #[arg(short, long)]
        page: String,

        /// URL the page was saved from
        #[arg(short, long)]
        url: String,

        /// Block-list file, one entry per line
        #[arg(short, long)]
        rules: String,

        /// Stored settings as JSON (storage key names)
        #[arg(short, long)]
        config: Option<String>,

        /// Write the annotated page here
        #[arg(short, long)]
        output: Option<String>,

        /// Mark the page as being in reveal mode
        #[arg(long)]
        reveal: bool,
    },

    /// Parse a block-list file and report problems
    Check {
        /// Block-list file
        #[arg(short, long)]
        rules: String,
    },

    /// Show how a URL is classified and which adapters run on it
    Classify {
        /// Search result URL
        url: String,

        /// Stored settings as JSON
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Append an entry to a block-list file
    Add {
        /// Block-list file (created when missing)
        #[arg(short, long)]
        rules: String,

        /// Text to block
        #[arg(short, long)]
        text: String,

        #[arg(long)]
        regex: bool,

        #[arg(long)]
        notitle: bool,

        #[arg(long)]
        nosite: bool,

        #[arg(long)]
        nodesc: bool,
    },

    /// Remove an entry from a block-list file
    Remove {
        /// Block-list file
        #[arg(short, long)]
        rules: String,

        /// Entry to remove, compared after trimming
        #[arg(short, long)]
        word: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            page,
            url,
            rules,
            config,
            output,
            reveal,
        } => cmd_filter(&page, &url, &rules, config.as_deref(), output.as_deref(), reveal),
        Commands::Check { rules } => cmd_check(&rules),
        Commands::Classify { url, config } => cmd_classify(&url, config.as_deref()),
        Commands::Add {
            rules,
            text,
            regex,
            notitle,
            nosite,
            nodesc,
        } => cmd_add(&rules, &text, options_from_flags(regex, notitle, nosite, nodesc)),
        Commands::Remove { rules, word } => cmd_remove(&rules, &word),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_text(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

fn write_text(path: &str, text: &str) -> Result<(), String> {
    fs::write(path, text).map_err(|e| format!("Failed to write '{}': {}", path, e))
}

fn load_config(path: Option<&str>) -> Result<StoredConfig, String> {
    match path {
        Some(path) => {
            let json = read_text(path)?;
            StoredConfig::from_json(&json).map_err(|e| format!("Invalid config '{}': {}", path, e))
        }
        None => Ok(StoredConfig::default()),
    }
}

fn options_from_flags(regex: bool, notitle: bool, nosite: bool, nodesc: bool) -> RuleOptions {
    let mut options = RuleOptions::empty();
    options.set(RuleOptions::REGEX, regex);
    options.set(RuleOptions::NO_TITLE, notitle);
    options.set(RuleOptions::NO_SITE, nosite);
    options.set(RuleOptions::NO_DESC, nodesc);
    options
}

/// Non-blank lines of a block-list file. Blank lines are not entries and
/// must not show up as duplicates of each other.
fn entry_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `tag#id.class` style label for a node.
fn describe(doc: &Document, node: &NodeId) -> String {
    let mut label = doc.tag_name(node).unwrap_or_else(|| "#text".to_string());
    if let Some(id) = doc.attribute(node, "id") {
        label.push('#');
        label.push_str(&id);
    }
    if let Some(classes) = doc.attribute(node, "class") {
        for class in classes.split_whitespace().filter(|c| !c.starts_with("ngw4b_")) {
            label.push('.');
            label.push_str(class);
        }
    }
    label
}

fn cmd_filter(
    page: &str,
    url: &str,
    rules: &str,
    config: Option<&str>,
    output: Option<&str>,
    reveal: bool,
) -> Result<(), String> {
    let html = read_text(page)?;
    let mut config = load_config(config)?;
    config.block_list = read_text(rules)?;

    let mut doc = Document::parse_html(&html);
    log::info!("filtering '{}' as {}", page, url);
    let mut session = FilterSession::new(url, config, Tuning::default(), NoopNotifier);
    if reveal {
        session.set_revealed(&mut doc, true);
    }

    let started = session.start(&mut doc);
    // Offline there is no flicker window to wait out
    if let Some(flicker) = started.flicker {
        session.on_timer(&mut doc, flicker);
    }
    let report = started.report;

    let state = session.state();
    println!("Page: {} ({})", state.page.host, state.page.page_type);
    if !report.ran {
        println!("Filtering is off for this page");
    }

    let engine = session.engine();
    for node in engine.hidden_cards(&doc) {
        let inspection = match engine.inspect(&doc, &node) {
            Some(inspection) => inspection,
            None => continue,
        };
        let field = match (inspection.field, &inspection.collapsed_by) {
            (Some(field), _) => field.to_string(),
            (None, Some(_)) => "collapsed".to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "  hidden {:<40} [{}] {}",
            describe(&doc, &node),
            field,
            inspection.words.join(" | ")
        );
    }

    println!("Cards:        {}", report.cards);
    println!("Hidden:       {}", report.hidden_count);
    println!(
        "  new {} / merged {} / collapsed {} / refused {}",
        report.newly_hidden, report.merged, report.collapsed, report.refused
    );
    if report.swept > 0 {
        println!("Swept:        {} empty slide(s)", report.swept);
    }
    if report.needs_relayout {
        println!("Relayout:     needed (grid page)");
    }
    for diagnostic in session.diagnostics() {
        println!("Skipped rule: {}", diagnostic.error);
    }

    if let Some(output) = output {
        write_text(output, &doc.to_html())?;
        println!("Wrote '{}'", output);
    }

    Ok(())
}

fn cmd_check(rules: &str) -> Result<(), String> {
    let text = read_text(rules)?;
    let set = RuleSet::parse(&text);
    let (_, stats) = dedupe_lines(&entry_lines(&text));

    println!("Block list: {}", rules);
    println!("  Lines:       {}", set.lines_seen());
    println!("  Rules:       {}", set.len());
    println!("  Active:      {}", set.active().count());
    println!("  Regex:       {}", set.iter().filter(|r| r.pattern().is_regex()).count());
    println!("  Duplicates:  {}", stats.deduped);

    if set.diagnostics().is_empty() {
        println!("No problems found");
    } else {
        println!("Problems:");
        for diagnostic in set.diagnostics() {
            println!("  {}", diagnostic.error);
        }
    }

    Ok(())
}

fn cmd_classify(url: &str, config: Option<&str>) -> Result<(), String> {
    let config = load_config(config)?;
    let page = PageContext::from_url(url);
    let adapters = select_adapters(&page, &config.sub_options);

    println!("URL:       {}", url);
    println!("Host:      {}", page.host);
    println!("Site:      {}", page.site.as_str());
    println!("Page type: {}", page.page_type);
    println!(
        "Enabled:   global {}, site {}",
        config.enabled,
        config.site_enabled(page.site)
    );
    if adapters.is_empty() {
        println!("Adapters:  none");
    } else {
        let names: Vec<&str> = adapters.iter().map(|a| a.as_str()).collect();
        println!("Adapters:  {}", names.join(", "));
    }

    Ok(())
}

fn cmd_add(rules: &str, text: &str, options: RuleOptions) -> Result<(), String> {
    let entry = format_entry(text, options).ok_or_else(|| "Nothing to add".to_string())?;
    let current = if Path::new(rules).exists() {
        read_text(rules)?
    } else {
        String::new()
    };

    let updated = append_entry(current.trim_end_matches('\n'), &entry);
    write_text(rules, &format!("{updated}\n"))?;
    println!("Added '{}' to '{}'", entry, rules);
    Ok(())
}

fn cmd_remove(rules: &str, word: &str) -> Result<(), String> {
    let current = read_text(rules)?;
    let updated = remove_entry(&current, word);
    if updated == current {
        return Err(format!("'{}' is not in '{}'", word.trim(), rules));
    }
    write_text(rules, &updated)?;
    println!("Removed '{}' from '{}'", word.trim(), rules);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_options() {
        let options = options_from_flags(true, false, true, false);
        assert_eq!(options, RuleOptions::REGEX | RuleOptions::NO_SITE);
        assert_eq!(format_entry("x", options).as_deref(), Some("x[nosite,regex]"));
    }

    #[test]
    fn blank_lines_are_not_duplicates() {
        let text = "foo\n\nbar\n   \nfoo\n\n";
        let (_, stats) = dedupe_lines(&entry_lines(text));
        assert_eq!(stats.before, 3);
        assert_eq!(stats.deduped, 1);
    }

    #[test]
    fn describe_skips_marker_classes() {
        let mut doc = Document::parse_html(r#"<html><body><li id="r" class="b_algo">x</li></body></html>"#);
        let node = doc.find_by_id("r").expect("node");
        doc.add_class(&node, "ngw4b_hidden");
        assert_eq!(describe(&doc, &node), "li#r.b_algo");
    }
}
