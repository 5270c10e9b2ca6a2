//! Command-line inspection of layered YAML config directories.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use layerconf::{DirSource, Loader, YamlTemplate};
use log::{debug, info};
use serde_yaml::Value;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Command-line options for the layerconf tool.
#[derive(Parser, Debug)]
#[command(name = "layerconf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged config of a directory
    Show {
        #[command(flatten)]
        source: SourceArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
    /// List the files a load would read and whether they exist
    Files {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the placeholder expansion of a single file
    Expand {
        /// File to expand
        file: PathBuf,
    },
}

/// Where config files are read from and which overlay applies.
#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding config.yaml and its overlays
    #[arg(long, env = "LAYERCONF_DIR", default_value = ".")]
    dir: PathBuf,
    /// Overlay name; defaults to the ENV variable
    #[arg(long)]
    env: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

impl SourceArgs {
    fn loader(&self) -> Loader<Value, DirSource> {
        let loader = Loader::new(DirSource::new(&self.dir));
        match &self.env {
            Some(env) => loader.with_selector(env.clone()),
            None => loader,
        }
    }
}

/// Entry point for the layerconf CLI.
fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    debug!("parsed command: {:?}", cli.command);
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Show { source, format } => {
            info!("showing config (dir={})", source.dir.display());
            let value = source
                .loader()
                .load_config()
                .context("failed to load layered config")?;
            stdout.write_all(render(&value, format)?.as_bytes())?;
        }
        Command::Files { source } => {
            let loader = source.loader();
            for file in loader.files() {
                writeln!(stdout, "{file}\t{}", file_status(loader.source(), &file))?;
            }
        }
        Command::Expand { file } => {
            let name = file.display().to_string();
            let reader =
                File::open(&file).with_context(|| format!("failed to open {name}"))?;
            YamlTemplate::new()
                .compile(&name, reader, &mut stdout)
                .with_context(|| format!("failed to expand {name}"))?;
        }
    }
    Ok(())
}

/// Serialize a merged document in the requested format.
fn render(value: &Value, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Yaml => serde_yaml::to_string(value).context("failed to encode YAML"),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn file_status(source: &DirSource, file: &str) -> &'static str {
    match source.path_of(file) {
        Ok(path) if path.is_file() => "found",
        Ok(_) => "missing",
        Err(_) => "invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_show_arguments() {
        let cli = Cli::try_parse_from([
            "layerconf", "show", "--dir", "conf", "--env", "test", "--format", "json",
        ])
        .expect("parse");
        match cli.command {
            Command::Show { source, format } => {
                assert_eq!(source.dir, PathBuf::from("conf"));
                assert_eq!(source.env.as_deref(), Some("test"));
                assert_eq!(format, Format::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn pinned_env_selects_overlay() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("config.yaml"), "server:\n  port: 8081\n").expect("write");
        fs::write(temp.path().join("config.test.yaml"), "server:\n  port: 8082\n")
            .expect("write");
        let args = SourceArgs {
            dir: temp.path().to_path_buf(),
            env: Some("test".to_string()),
        };

        let loader = args.loader();
        assert_eq!(file_status(loader.source(), "config.test.yaml"), "found");
        assert_eq!(file_status(loader.source(), "config.prod.yaml"), "missing");
        assert_eq!(file_status(loader.source(), "../config.yaml"), "invalid");

        let value = loader.load_config().expect("config");
        assert_eq!(render(&value, Format::Yaml).expect("yaml"), "server:\n  port: 8082\n");
        assert_eq!(
            render(&value, Format::Json).expect("json"),
            "{\n  \"server\": {\n    \"port\": 8082\n  }\n}\n"
        );
    }
}
