//! `joran check` command handler

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::info;

use joran_core::component::ComponentRef;
use joran_core::config::JoranConfig;
use joran_core::repository::{LoggerRef, LoggerRepository};
use joran_core::types::ErrorItem;
use joran_interpreter::{ConfigurationReport, JoranConfigurator};

use crate::cli::CheckArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `check` command.
///
/// Interprets the document against a fresh repository and renders the
/// outcome. A rejected document surfaces as `CliError::Document` before
/// anything is rendered; recorded errors are rendered first and then turned
/// into `CliError::Recoverable` unless errors are allowed.
pub async fn execute(
    args: CheckArgs,
    config: &JoranConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(document = %args.file.display(), "checking configuration document");

    let mut configurator = JoranConfigurator::from_config(config);
    for (name, value) in args.defines {
        configurator = configurator.with_property(name, value);
    }

    let repository = LoggerRepository::new_ref();
    let report = configurator.configure_file(&args.file, &repository).await?;

    let check = CheckReport::new(
        args.file.display().to_string(),
        report,
        &repository.borrow(),
    );
    writer.render(&check)?;

    let fail_on_error = config.interpreter.fail_on_error && !args.allow_errors;
    if fail_on_error && !check.clean {
        return Err(CliError::Recoverable(check.errors.len()));
    }
    Ok(())
}

/// Outcome of checking one document.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Document path
    pub document: String,
    /// No recoverable errors were recorded
    pub clean: bool,
    pub elements: u64,
    pub skipped: u64,
    pub dropped: usize,
    pub errors: Vec<ErrorItem>,
    pub warnings: Vec<ErrorItem>,
    /// Repository-wide threshold after configuration
    pub threshold: String,
    /// Root first, then named loggers in name order
    pub loggers: Vec<LoggerSummary>,
    /// Every appender reachable from a logger, by name
    pub appenders: Vec<AppenderSummary>,
    /// Plugins started on the repository, by name
    pub plugins: Vec<PluginSummary>,
    /// Logger factory class, if one was configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger_factory: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoggerSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub additivity: bool,
    pub appenders: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AppenderSummary {
    pub name: String,
    pub class: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Tags of nested components other than the layout
    pub nested: Vec<String>,
    /// Names of appenders this one forwards to
    pub refs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub class: String,
    pub active: bool,
}

impl CheckReport {
    pub fn new(document: String, report: ConfigurationReport, repository: &LoggerRepository) -> Self {
        let root = repository.root();
        let mut loggers = vec![summarize_logger(&root)];
        loggers.extend(repository.loggers().map(summarize_logger));

        let mut appenders = BTreeMap::new();
        collect_appenders(root.borrow().appenders(), &mut appenders);
        for logger in repository.loggers() {
            collect_appenders(logger.borrow().appenders(), &mut appenders);
        }

        let plugins = repository
            .plugins()
            .map(|(name, plugin)| {
                let plugin = plugin.borrow();
                PluginSummary {
                    name: name.to_owned(),
                    class: plugin.class().to_owned(),
                    active: plugin.is_active(),
                }
            })
            .collect();
        let logger_factory = repository
            .logger_factory()
            .map(|factory| factory.borrow().class().to_owned());

        Self {
            document,
            clean: report.is_clean(),
            elements: report.elements,
            skipped: report.skipped,
            dropped: report.dropped,
            errors: report.errors,
            warnings: report.warnings,
            threshold: repository.threshold().to_string(),
            loggers,
            appenders: appenders.into_values().collect(),
            plugins,
            logger_factory,
        }
    }
}

fn summarize_logger(logger: &LoggerRef) -> LoggerSummary {
    let logger = logger.borrow();
    LoggerSummary {
        name: logger.name().to_owned(),
        level: logger.level().map(|l| l.to_string()),
        additivity: logger.additivity(),
        appenders: logger.appender_names(),
    }
}

/// Walk appenders and their forwarding references, keyed by name.
fn collect_appenders(appenders: &[ComponentRef], out: &mut BTreeMap<String, AppenderSummary>) {
    for appender in appenders {
        let component = appender.borrow();
        let name = component.name().unwrap_or("<unnamed>").to_owned();
        if out.contains_key(&name) {
            continue;
        }

        let layout = component
            .child("layout")
            .map(|layout| layout.borrow().class().to_owned());
        let nested = component
            .children()
            .iter()
            .filter(|(tag, _)| tag != "layout")
            .map(|(tag, _)| tag.clone())
            .collect();
        let refs: Vec<String> = component
            .appender_refs()
            .iter()
            .map(|r| r.borrow().name().unwrap_or("<unnamed>").to_owned())
            .collect();

        out.insert(
            name.clone(),
            AppenderSummary {
                name,
                class: component.class().to_owned(),
                active: component.is_active(),
                layout,
                nested,
                refs,
            },
        );
        collect_appenders(component.appender_refs(), out);
    }
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Document: {}", self.document.bold())?;
        if self.clean {
            writeln!(w, "  Result: {}", "CLEAN".green().bold())?;
        } else {
            writeln!(
                w,
                "  Result: {} ({} error(s))",
                "ERRORS".red().bold(),
                self.errors.len()
            )?;
        }
        writeln!(
            w,
            "  Elements: {} processed, {} skipped, {} dropped",
            self.elements, self.skipped, self.dropped
        )?;
        writeln!(w, "  Threshold: {}", self.threshold)?;

        if !self.errors.is_empty() {
            writeln!(w)?;
            writeln!(w, "Errors:")?;
            for e in &self.errors {
                writeln!(w, "  {} {}", position(e).red(), e.message)?;
                if let Some(ref cause) = e.cause {
                    writeln!(w, "      caused by: {cause}")?;
                }
            }
        }

        if !self.warnings.is_empty() {
            writeln!(w)?;
            writeln!(w, "Warnings:")?;
            for e in &self.warnings {
                writeln!(w, "  {} {}", position(e).yellow(), e.message)?;
            }
        }

        writeln!(w)?;
        writeln!(w, "{:<30} {:<8} {:<10} Appenders", "Logger", "Level", "Additive")?;
        writeln!(w, "{}", "-".repeat(70))?;
        for l in &self.loggers {
            writeln!(
                w,
                "{:<30} {:<8} {:<10} {}",
                l.name,
                l.level.as_deref().unwrap_or("-"),
                l.additivity,
                l.appenders.join(", ")
            )?;
        }

        if !self.appenders.is_empty() {
            writeln!(w)?;
            writeln!(w, "{:<16} {:<45} Layout", "Appender", "Class")?;
            writeln!(w, "{}", "-".repeat(80))?;
            for a in &self.appenders {
                let name = if a.active {
                    a.name.normal()
                } else {
                    a.name.yellow()
                };
                writeln!(
                    w,
                    "{:<16} {:<45} {}",
                    name,
                    a.class,
                    a.layout.as_deref().unwrap_or("-")
                )?;
                if !a.nested.is_empty() {
                    writeln!(w, "  nested: {}", a.nested.join(", "))?;
                }
                if !a.refs.is_empty() {
                    writeln!(w, "  forwards to: {}", a.refs.join(", "))?;
                }
            }
        }

        if !self.plugins.is_empty() {
            writeln!(w)?;
            writeln!(w, "{:<16} {:<45} Active", "Plugin", "Class")?;
            writeln!(w, "{}", "-".repeat(70))?;
            for p in &self.plugins {
                writeln!(w, "{:<16} {:<45} {}", p.name, p.class, p.active)?;
            }
        }
        if let Some(ref factory) = self.logger_factory {
            writeln!(w)?;
            writeln!(w, "Logger factory: {factory}")?;
        }

        Ok(())
    }
}

fn position(e: &ErrorItem) -> String {
    match (e.line, e.column) {
        (Some(line), Some(column)) => format!("[{line}:{column}]"),
        (Some(line), None) => format!("[{line}]"),
        _ => "[-]".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<configuration threshold="info">
  <appender name="FILE" class="org.apache.log4j.FileAppender">
    <param name="File" value="/tmp/app.log"/>
    <layout class="org.apache.log4j.SimpleLayout"/>
  </appender>
  <appender name="ASYNC" class="org.apache.log4j.AsyncAppender">
    <appender-ref ref="FILE"/>
  </appender>
  <logger name="com.example">
    <level value="debug"/>
    <appender-ref ref="MISSING"/>
  </logger>
  <root>
    <appender-ref ref="ASYNC"/>
  </root>
</configuration>"#;

    fn check(document: &str) -> CheckReport {
        let repository = LoggerRepository::new_ref();
        let report = JoranConfigurator::new()
            .configure_str(document, &repository)
            .expect("document should parse");
        CheckReport::new("log4j.xml".to_owned(), report, &repository.borrow())
    }

    #[test]
    fn test_check_report_summarizes_repository() {
        let report = check(DOCUMENT);

        assert!(!report.clean);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("MISSING"));
        assert_eq!(report.threshold, "INFO");

        let names: Vec<_> = report.loggers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["root", "com.example"]);
        assert_eq!(report.loggers[0].appenders, vec!["ASYNC"]);

        // ASYNC는 루트에서, FILE은 ASYNC의 참조를 따라 수집된다
        let appenders: Vec<_> = report.appenders.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(appenders, vec!["ASYNC", "FILE"]);
        assert_eq!(report.appenders[0].refs, vec!["FILE"]);
        assert_eq!(
            report.appenders[1].layout.as_deref(),
            Some("org.apache.log4j.SimpleLayout")
        );
    }

    #[test]
    fn test_check_report_render_text() {
        let report = check(DOCUMENT);
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("log4j.xml"), "should contain document path");
        assert!(output.contains("ERRORS"), "should flag errors");
        assert!(output.contains("MISSING"), "should list the error message");
        assert!(output.contains("com.example"), "should list loggers");
        assert!(output.contains("forwards to: FILE"), "should list appender refs");
    }

    #[test]
    fn test_check_report_json_shape() {
        let report = check(r#"<configuration><root><level value="warn"/></root></configuration>"#);
        let json = serde_json::to_value(&report).expect("serialize");

        assert_eq!(json["clean"], true);
        assert_eq!(json["elements"], 3);
        assert!(json["errors"].as_array().expect("array").is_empty());
        assert_eq!(json["loggers"][0]["name"], "root");
        assert_eq!(json["loggers"][0]["level"], "WARN");
    }

    #[test]
    fn test_check_report_lists_plugins() {
        let report = check(
            r#"<configuration>
  <plugin name="remote" class="org.apache.log4j.net.SocketReceiver">
    <param name="Port" value="4560"/>
  </plugin>
  <loggerFactory class="org.apache.log4j.DefaultCategoryFactory"/>
</configuration>"#,
        );
        assert!(report.clean, "{:?}", report.errors);
        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.plugins[0].name, "remote");
        assert!(report.plugins[0].active);
        assert_eq!(
            report.logger_factory.as_deref(),
            Some("org.apache.log4j.DefaultCategoryFactory")
        );

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("SocketReceiver"));
        assert!(output.contains("Logger factory: org.apache.log4j.DefaultCategoryFactory"));
    }

    #[test]
    fn test_position_formatting() {
        let item = ErrorItem::new("x");
        assert_eq!(position(&item), "[-]");

        let mut item = ErrorItem::new("x");
        item.line = Some(4);
        item.column = Some(9);
        assert_eq!(position(&item), "[4:9]");
    }
}
