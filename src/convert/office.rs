//! Office-document conversion through an external native renderer.
//!
//! Word-processor, spreadsheet and presentation formats are not rendered
//! in-process; they go through a headless office binary (LibreOffice by
//! default) treated as a black box that succeeds, fails, or hangs. A
//! watchdog kills hung renderers so one stuck file cannot stall the whole
//! migration.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::ConvertError;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct OfficeRenderer {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for OfficeRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("soffice"),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OfficeRenderer {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Convert `source` to a PDF at `dest` via
    /// `<program> --headless --convert-to pdf --outdir <dir> <source>`.
    pub fn render(&self, source: &Path, dest: &Path) -> Result<(), ConvertError> {
        let out_dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let program = self.program.to_string_lossy().to_string();

        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ConvertError::Renderer {
                program: program.clone(),
                detail: format!("failed to start: {e}"),
            })?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConvertError::RendererTimeout {
                        program,
                        secs: self.timeout.as_secs(),
                    });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            return Err(ConvertError::Renderer {
                program,
                detail: format!("exit status {status}"),
            });
        }

        // The renderer names its output <source stem>.pdf inside out_dir;
        // move it onto the requested destination.
        let produced = out_dir
            .join(source.file_stem().unwrap_or_default())
            .with_extension("pdf");
        if !produced.is_file() {
            return Err(ConvertError::Renderer {
                program,
                detail: format!("reported success but produced no {}", produced.display()),
            });
        }
        if produced != dest {
            std::fs::rename(&produced, dest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_renderer_binary_is_a_typed_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("letter.docx");
        std::fs::write(&src, b"fake docx").unwrap();

        let renderer = OfficeRenderer::new(
            PathBuf::from("definitely-not-a-real-office-binary"),
            Duration::from_secs(5),
        );
        let err = renderer
            .render(&src, &dir.path().join("letter.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Renderer { .. }));
    }

    #[cfg(unix)]
    fn fake_renderer(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("fake-office.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn failing_renderer_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("sheet.xlsx");
        std::fs::write(&src, b"fake xlsx").unwrap();

        let script = fake_renderer(dir.path(), "exit 77");
        let renderer = OfficeRenderer::new(script, Duration::from_secs(5));
        let err = renderer
            .render(&src, &dir.path().join("sheet.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Renderer { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn hung_renderer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("deck.pptx");
        std::fs::write(&src, b"fake pptx").unwrap();

        let script = fake_renderer(dir.path(), "sleep 30");
        let renderer = OfficeRenderer::new(script, Duration::from_millis(300));
        let err = renderer
            .render(&src, &dir.path().join("deck.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::RendererTimeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn successful_renderer_output_is_moved_to_dest() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("letter.docx");
        std::fs::write(&src, b"fake docx").unwrap();

        // Mimics soffice: writes <stem>.pdf into the --outdir argument ($6).
        let script = fake_renderer(dir.path(), "printf '%%PDF-fake' > \"$6/letter.pdf\"");
        let renderer = OfficeRenderer::new(script, Duration::from_secs(5));
        let dest = dir.path().join("letter0.pdf");
        renderer.render(&src, &dest).unwrap();
        assert!(dest.is_file());
        assert!(!dir.path().join("letter.pdf").exists());
    }
}
