use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::fields::FieldsSource;
use super::fields::layout::TSHARK_FIELDS;
use super::SourceError;

const DEFAULT_PROGRAM: &str = "tshark";
const UDP_DISPLAY_FILTER: &str = "udp";
/// Repeated fields (tunnelled IP headers) would otherwise be joined with the
/// column separator.
const FIRST_OCCURRENCE: &str = "occurrence=f";

/// External capture decoder: runs tshark and reads its fields output.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use seqshark_core::TsharkDecoder;
///
/// let decoder = TsharkDecoder::default();
/// let args = decoder.args(Path::new("capture.pcapng"));
/// assert_eq!(args[0], "-r");
/// assert!(args.iter().any(|arg| arg == "data.data"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsharkDecoder {
    program: PathBuf,
}

impl Default for TsharkDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl TsharkDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self, capture: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-r".into(),
            capture.as_os_str().to_owned(),
            "-Y".into(),
            UDP_DISPLAY_FILTER.into(),
            "-T".into(),
            "fields".into(),
            "-E".into(),
            "separator=,".into(),
            "-E".into(),
            "header=y".into(),
            "-E".into(),
            FIRST_OCCURRENCE.into(),
        ];
        for field in TSHARK_FIELDS {
            args.push("-e".into());
            args.push(field.into());
        }
        args
    }

    /// Run the decoder to completion and return a source over its output.
    pub fn decode(&self, capture: &Path) -> Result<FieldsSource<Cursor<Vec<u8>>>, SourceError> {
        log::debug!(
            "running {} on {}",
            self.program.display(),
            capture.display()
        );
        let output = Command::new(&self.program)
            .args(self.args(capture))
            .output()
            .map_err(|err| {
                SourceError::Decoder(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    err
                ))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Decoder(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        FieldsSource::new(Cursor::new(output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::TsharkDecoder;
    use crate::source::SourceError;
    use std::path::Path;

    #[test]
    fn args_request_fields_in_order() {
        let decoder = TsharkDecoder::default();
        let args = decoder.args(Path::new("in.pcap"));
        let fields: Vec<_> = args
            .windows(2)
            .filter(|pair| pair[0] == "-e")
            .map(|pair| pair[1].to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            fields,
            vec![
                "frame.number",
                "frame.time_epoch",
                "ip.src",
                "ip.dst",
                "frame.len",
                "data.data"
            ]
        );
    }

    #[test]
    fn args_keep_first_occurrence_only() {
        let args = TsharkDecoder::default().args(Path::new("in.pcap"));
        let options: Vec<_> = args
            .windows(2)
            .filter(|pair| pair[0] == "-E")
            .map(|pair| pair[1].to_string_lossy().into_owned())
            .collect();
        assert_eq!(options, vec!["separator=,", "header=y", "occurrence=f"]);
    }

    #[test]
    fn missing_program_is_a_decoder_error() {
        let decoder = TsharkDecoder::new("/nonexistent/seqshark-tshark");
        let err = match decoder.decode(Path::new("in.pcap")) {
            Ok(_) => panic!("expected decoder failure"),
            Err(err) => err,
        };
        assert!(matches!(err, SourceError::Decoder(msg) if msg.contains("failed to run")));
    }
}
