//! Command line construction for the test tool

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DispatcherConfig;
use cukerun_common::RunOptions;

/// Leading `Scenario:` label copied from a feature file or a report
static SCENARIO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^scenario\s*:\s*").expect("scenario prefix regex"));

/// A program and its arguments, spawned without a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Program followed by every argument
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-quoted rendering, for logs only
    pub fn display(&self) -> String {
        let argv = self.argv();
        shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
    }
}

/// Turns run options into a command line
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    config: DispatcherConfig,
}

impl ArgumentBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Build the full command line.
    ///
    /// Order: fixed prefix, `--name` per test name, `--tags` for the suite,
    /// `--tags` for the joined tag list.
    pub fn build(&self, options: &RunOptions) -> CommandLine {
        let mut argv = self.prefix();

        for name in &options.test_names {
            argv.push("--name".to_string());
            argv.push(strip_scenario_prefix(name).to_string());
        }

        if let Some(suite) = &options.suite {
            argv.push("--tags".to_string());
            argv.push(normalize_tag(suite));
        }

        if !options.tags.is_empty() {
            let joined = options
                .tags
                .iter()
                .map(|t| normalize_tag(t))
                .collect::<Vec<_>>()
                .join(" ");
            argv.push("--tags".to_string());
            argv.push(joined);
        }

        let mut argv = argv.into_iter();
        CommandLine {
            program: argv.next().unwrap_or_default(),
            args: argv.collect(),
        }
    }

    fn prefix(&self) -> Vec<String> {
        let cfg = &self.config;
        let mut argv = cfg.command.clone();
        argv.push(cfg.feature_glob.clone());
        argv.push("--format".to_string());
        argv.push(cfg.format.clone());
        for module in &cfg.require_module {
            argv.push("--require-module".to_string());
            argv.push(module.clone());
        }
        for path in &cfg.require {
            argv.push("--require".to_string());
            argv.push(path.clone());
        }
        argv
    }
}

/// Remove a leading `Scenario:` label, if any.
pub fn strip_scenario_prefix(name: &str) -> &str {
    match SCENARIO_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Ensure a tag carries exactly one leading `@` added by us.
pub fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('@') {
        tag.to_string()
    } else {
        format!("@{}", tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ArgumentBuilder {
        ArgumentBuilder::new(DispatcherConfig {
            command: vec!["npx".into(), "cucumber-js".into()],
            feature_glob: "features/*.feature".into(),
            format: "json".into(),
            require_module: vec![],
            require: vec!["steps/*.ts".into(), "support/*.ts".into()],
            ..Default::default()
        })
    }

    const PREFIX: [&str; 9] = [
        "npx",
        "cucumber-js",
        "features/*.feature",
        "--format",
        "json",
        "--require",
        "steps/*.ts",
        "--require",
        "support/*.ts",
    ];

    #[test]
    fn test_prefix_only() {
        let cmd = builder().build(&RunOptions::default());
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.argv(), PREFIX);
    }

    #[test]
    fn test_require_module_before_require() {
        let cmd = ArgumentBuilder::new(DispatcherConfig::default()).build(&RunOptions::default());
        let argv = cmd.argv();
        let module = argv.iter().position(|a| a == "--require-module").unwrap();
        let require = argv.iter().position(|a| a == "--require").unwrap();
        assert!(module < require);
        assert_eq!(argv[module + 1], "ts-node/register");
    }

    #[test]
    fn test_full_ordering() {
        let options = RunOptions::default()
            .with_test_names(["Scenario: Price is shown", "Filter by rank"])
            .with_suite("smoke")
            .with_tags(["mobile", "@fast"]);

        let argv = builder().build(&options).argv();
        assert_eq!(&argv[..PREFIX.len()], PREFIX);
        assert_eq!(
            &argv[PREFIX.len()..],
            [
                "--name",
                "Price is shown",
                "--name",
                "Filter by rank",
                "--tags",
                "@smoke",
                "--tags",
                "@mobile @fast",
            ]
        );
    }

    #[test]
    fn test_name_with_spaces_is_one_argument() {
        let options = RunOptions::default().with_test_names(["a name with  spaces"]);
        let argv = builder().build(&options).argv();
        assert_eq!(argv.last().map(String::as_str), Some("a name with  spaces"));
    }

    #[test]
    fn test_strip_scenario_prefix() {
        assert_eq!(strip_scenario_prefix("Scenario: Login"), "Login");
        assert_eq!(strip_scenario_prefix("scenario:Login"), "Login");
        assert_eq!(strip_scenario_prefix("SCENARIO :   Login"), "Login");
        assert_eq!(strip_scenario_prefix("Login Scenario: x"), "Login Scenario: x");
        assert_eq!(strip_scenario_prefix("Scenarios: x"), "Scenarios: x");
        assert_eq!(strip_scenario_prefix("Login"), "Login");
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("smoke"), "@smoke");
        assert_eq!(normalize_tag("@smoke"), "@smoke");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let options = RunOptions::default().with_tags(["a", "a"]);
        let argv = builder().build(&options).argv();
        assert_eq!(argv.last().map(String::as_str), Some("@a @a"));
    }

    #[test]
    fn test_display_quotes_arguments() {
        let options = RunOptions::default().with_test_names(["Price is shown"]);
        let shown = builder().build(&options).display();
        assert!(shown.starts_with("npx cucumber-js"));
        assert!(shown.contains("--name 'Price is shown'"));
    }
}
