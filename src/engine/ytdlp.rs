//! `yt-dlp` executable driver.

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::debug;

use super::{EngineError, EngineOptions, MediaEngine, MediaInfo};

/// Runs the `yt-dlp` binary once per call and reads the single JSON info
/// document it prints on stdout.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command line for one call, excluding the binary itself.
    pub fn build_args(&self, url: &str, options: &EngineOptions) -> Vec<String> {
        let mut args = Vec::new();

        if options.quiet {
            args.extend(["--quiet".to_string(), "--no-warnings".to_string()]);
        }
        if !options.check_certificate {
            args.push("--no-check-certificates".to_string());
        }

        args.extend([
            "--socket-timeout".to_string(),
            options.socket_timeout.as_secs().to_string(),
        ]);

        if options.retries > 0 {
            args.extend(["--retries".to_string(), options.retries.to_string()]);
        }
        if options.fragment_retries > 0 {
            args.extend([
                "--fragment-retries".to_string(),
                options.fragment_retries.to_string(),
            ]);
        }
        if let Some(format) = &options.format {
            args.extend(["--format".to_string(), format.clone()]);
        }
        if let Some(template) = &options.output_template {
            args.extend([
                "--output".to_string(),
                template.to_string_lossy().to_string(),
            ]);
        }
        if options.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if let Some(filter) = &options.match_filter {
            args.extend(["--match-filter".to_string(), filter.clone()]);
        }
        if let Some(container) = &options.merge_output_format {
            args.extend(["--merge-output-format".to_string(), container.clone()]);
        }

        // -J implies simulate; downloads have to opt back in.
        args.push("--dump-single-json".to_string());
        if options.skip_download {
            args.push("--skip-download".to_string());
        } else {
            args.push("--no-simulate".to_string());
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn run(&self, args: &[String]) -> Result<Output, EngineError> {
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| {
                EngineError(format!(
                    "Failed to execute {}: {}",
                    self.binary.display(),
                    e
                ))
            })
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl MediaEngine for YtDlpEngine {
    fn version(&self) -> Result<String, EngineError> {
        let output = self.run(&["--version".to_string()])?;
        if !output.status.success() {
            return Err(failure_message(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn extract(&self, url: &str, options: &EngineOptions) -> Result<MediaInfo, EngineError> {
        let args = self.build_args(url, options);
        debug!(url, download = !options.skip_download, "Invoking yt-dlp");

        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(failure_message(&output));
        }

        parse_info(&output.stdout, options)
    }
}

/// Parse the info document. yt-dlp prints nothing (or `null`) when a match
/// filter skipped the item, and still exits successfully.
fn parse_info(stdout: &[u8], options: &EngineOptions) -> Result<MediaInfo, EngineError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();

    let info = if text.is_empty() {
        None
    } else {
        serde_json::from_str::<Option<MediaInfo>>(text)
            .map_err(|e| EngineError(format!("Unreadable engine output: {}", e)))?
    };

    info.ok_or_else(|| match &options.match_filter {
        Some(filter) => EngineError(format!("Video does not pass filter ({filter}), skipping")),
        None => EngineError("Engine returned no media information".to_string()),
    })
}

/// Prefer the `ERROR:` lines; fall back to all of stderr, then the exit status.
fn failure_message(output: &Output) -> EngineError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return EngineError(errors.join("\n"));
    }

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return EngineError(stderr.to_string());
    }

    EngineError(format!("yt-dlp exited with {}", output.status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_download_args() {
        let engine = YtDlpEngine::default();
        let opts = EngineOptions::download(
            "best".to_string(),
            PathBuf::from("/downloads/clip1.%(ext)s"),
            600,
        );
        let args = engine.build_args("https://example.com/v", &opts);

        assert_eq!(flag_value(&args, "--format"), Some("best"));
        assert_eq!(flag_value(&args, "--output"), Some("/downloads/clip1.%(ext)s"));
        assert_eq!(flag_value(&args, "--socket-timeout"), Some("30"));
        assert_eq!(flag_value(&args, "--retries"), Some("5"));
        assert_eq!(flag_value(&args, "--fragment-retries"), Some("5"));
        assert_eq!(flag_value(&args, "--match-filter"), Some("duration <= 600"));
        assert_eq!(flag_value(&args, "--merge-output-format"), Some("mp4"));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert!(args.contains(&"--no-simulate".to_string()));
        assert!(!args.contains(&"--skip-download".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[test]
    fn test_metadata_args() {
        let engine = YtDlpEngine::default();
        let args = engine.build_args("https://example.com/v", &EngineOptions::metadata());

        assert_eq!(flag_value(&args, "--socket-timeout"), Some("15"));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.contains(&"--quiet".to_string()));
        assert!(flag_value(&args, "--format").is_none());
        assert!(flag_value(&args, "--match-filter").is_none());
    }

    #[test]
    fn test_parse_info_document() {
        let opts = EngineOptions::metadata();
        let info = parse_info(br#"{"title": "Clip", "duration": 61}"#, &opts).unwrap();
        assert_eq!(info.title.as_deref(), Some("Clip"));
        assert_eq!(info.duration, Some(61.0));
    }

    #[test]
    fn test_skipped_by_filter() {
        let opts = EngineOptions::download("best".into(), PathBuf::from("/d/x.%(ext)s"), 600);
        let err = parse_info(b"null\n", &opts).unwrap_err();
        assert!(err.0.contains("does not pass filter"));
        assert!(err.0.contains("duration"));
    }

    #[test]
    fn test_missing_binary_is_engine_error() {
        let engine = YtDlpEngine::new("/nonexistent/yt-dlp-binary");
        let err = engine.version().unwrap_err();
        assert!(err.0.contains("Failed to execute"));
    }
}
