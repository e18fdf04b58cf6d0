use std::io::Read;
use std::path::{Path, PathBuf};

use parley_message::{FormatError, IngestOptions, MessageFormat, MessageIn, NewMessage};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

use super::settings::{IngestSettings, SettingsError, SettingsStore};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunnerArgs {
    /// `None` or `-` reads stdin.
    pub input: Option<PathBuf>,
    pub default_format: Option<String>,
    pub strict: bool,
    pub config_path: Option<PathBuf>,
    pub save_settings: bool,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("missing value for argument '{arg}'"))]
    MissingArgumentValue {
        stage: &'static str,
        arg: &'static str,
    },
    #[snafu(display("unknown argument '{raw}'"))]
    UnknownArgument { stage: &'static str, raw: String },
    #[snafu(display("unsupported input format: {raw}"))]
    UnknownFormatArgument { stage: &'static str, raw: String },
    #[snafu(display("failed to read input from {source_name}: {source}"))]
    ReadInput {
        stage: &'static str,
        source_name: String,
        source: std::io::Error,
    },
    #[snafu(display("input is not a message object or array: {source}"))]
    ParseInput {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("message #{index} rejected: {source}"))]
    Rejected {
        stage: &'static str,
        index: usize,
        source: FormatError,
    },
    #[snafu(display("failed to encode output: {source}"))]
    EncodeOutput {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("settings update failed: {source}"))]
    Settings {
        stage: &'static str,
        source: SettingsError,
    },
}

pub type CliResult<T> = Result<T, CliError>;

pub fn parse_args(args: impl IntoIterator<Item = String>) -> CliResult<RunnerArgs> {
    let mut parsed = RunnerArgs::default();
    let mut pending = args.into_iter();

    while let Some(argument) = pending.next() {
        match argument.as_str() {
            "--input" => {
                let value = pending.next().context(MissingArgumentValueSnafu {
                    stage: "parse-args-input-value",
                    arg: "--input",
                })?;
                parsed.input = Some(PathBuf::from(value));
            }
            "--format" => {
                let value = pending.next().context(MissingArgumentValueSnafu {
                    stage: "parse-args-format-value",
                    arg: "--format",
                })?;
                ensure!(
                    MessageFormat::parse(&value).is_some(),
                    UnknownFormatArgumentSnafu {
                        stage: "parse-args-format",
                        raw: value,
                    }
                );
                parsed.default_format = Some(value);
            }
            "--config" => {
                let value = pending.next().context(MissingArgumentValueSnafu {
                    stage: "parse-args-config-value",
                    arg: "--config",
                })?;
                parsed.config_path = Some(PathBuf::from(value));
            }
            "--strict" => parsed.strict = true,
            "--save-settings" => parsed.save_settings = true,
            _ => {
                return UnknownArgumentSnafu {
                    stage: "parse-args",
                    raw: argument,
                }
                .fail();
            }
        }
    }

    Ok(parsed)
}

/// Accepts either one message object or an array of them.
pub fn parse_batch(raw: &str) -> CliResult<Vec<MessageIn>> {
    let value: serde_json::Value = serde_json::from_str(raw).context(ParseInputSnafu {
        stage: "parse-input-json",
    })?;
    if value.is_array() {
        serde_json::from_value(value).context(ParseInputSnafu {
            stage: "parse-input-batch",
        })
    } else {
        serde_json::from_value(value)
            .map(|message| vec![message])
            .context(ParseInputSnafu {
                stage: "parse-input-message",
            })
    }
}

/// Prepares every message, stopping at the first rejection.
pub fn ingest_batch(batch: &[MessageIn], options: &IngestOptions) -> CliResult<Vec<NewMessage>> {
    batch
        .iter()
        .enumerate()
        .map(|(index, message)| {
            parley_message::prepare_message(message, options).context(RejectedSnafu {
                stage: "ingest-batch",
                index,
            })
        })
        .collect()
}

/// Resolves settings, applies command-line overrides and returns the canonical
/// drafts as pretty JSON.
pub fn run(args: &RunnerArgs) -> CliResult<String> {
    let store = match &args.config_path {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::load(),
    };
    let settings = effective_settings(&store.settings(), args);

    if args.save_settings {
        store.update(settings.clone()).context(SettingsSnafu {
            stage: "run-save-settings",
        })?;
    }

    let raw = read_input(args.input.as_deref())?;
    let batch = parse_batch(&raw)?;
    let drafts = ingest_batch(&batch, &settings.ingest_options())?;
    tracing::info!(
        messages = drafts.len(),
        default_format = %settings.default_format,
        "normalized input batch"
    );

    serde_json::to_string_pretty(&drafts).context(EncodeOutputSnafu {
        stage: "run-encode-output",
    })
}

fn effective_settings(current: &IngestSettings, args: &RunnerArgs) -> IngestSettings {
    let mut settings = current.clone();
    if let Some(format) = &args.default_format {
        settings.default_format = format.clone();
    }
    if args.strict {
        settings.reject_unknown_part_types = true;
    }
    settings.normalized()
}

fn read_input(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).context(ReadInputSnafu {
                stage: "read-input-file",
                source_name: path.display().to_string(),
            })
        }
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context(ReadInputSnafu {
                    stage: "read-input-stdin",
                    source_name: "stdin",
                })?;
            Ok(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_message::{PartTypePolicy, Role};

    use super::*;

    fn args(raw: &[&str]) -> CliResult<RunnerArgs> {
        parse_args(raw.iter().map(|value| value.to_string()))
    }

    #[test]
    fn parses_every_flag() {
        let parsed = args(&[
            "--input",
            "body.json",
            "--format",
            "anthropic",
            "--strict",
            "--config",
            "cfg.json",
            "--save-settings",
        ])
        .unwrap();
        assert_eq!(parsed.input, Some(PathBuf::from("body.json")));
        assert_eq!(parsed.default_format.as_deref(), Some("anthropic"));
        assert!(parsed.strict);
        assert_eq!(parsed.config_path, Some(PathBuf::from("cfg.json")));
        assert!(parsed.save_settings);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            args(&["--input"]),
            Err(CliError::MissingArgumentValue { arg: "--input", .. })
        ));
        assert!(matches!(
            args(&["--format", "cohere"]),
            Err(CliError::UnknownFormatArgument { .. })
        ));
        assert!(matches!(
            args(&["--verbose"]),
            Err(CliError::UnknownArgument { .. })
        ));
    }

    #[test]
    fn batch_accepts_object_or_array() {
        let one = parse_batch(r#"{ "role": "user", "parts": [] }"#).unwrap();
        assert_eq!(one.len(), 1);
        let many = parse_batch(r#"[{ "role": "user" }, { "role": "ai", "format": "langchain" }]"#)
            .unwrap();
        assert_eq!(many.len(), 2);
        assert!(matches!(
            parse_batch(r#""just a string""#),
            Err(CliError::ParseInput { .. })
        ));
    }

    #[test]
    fn batch_stops_at_first_rejection_with_its_index() {
        let batch = parse_batch(
            r#"[
                { "format": "anthropic", "role": "user" },
                { "format": "anthropic", "role": "system" },
                { "format": "cohere", "role": "user" }
            ]"#,
        )
        .unwrap();
        match ingest_batch(&batch, &IngestOptions::default()) {
            Err(CliError::Rejected { index, source, .. }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, FormatError::InvalidRole { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_on_top_of_stored_settings() {
        let stored = IngestSettings::default();
        let parsed = args(&["--format", "langchain", "--strict"]).unwrap();
        let settings = effective_settings(&stored, &parsed);
        let options = settings.ingest_options();
        assert_eq!(options.default_format, MessageFormat::LangChain);
        assert_eq!(options.part_types, PartTypePolicy::RejectUnknown);

        let batch = parse_batch(r#"{ "role": "human" }"#).unwrap();
        let drafts = ingest_batch(&batch, &options).unwrap();
        assert_eq!(drafts[0].role, Role::User);
    }
}
