use crate::{
    config::CodeIssuerConfig,
    error::CodeIssuerError,
    log::ISSUER,
    prometheus::{CODES_ISSUED_TOTAL, CODE_ISSUE_DURATION_SECONDS, CODE_ISSUE_ERROR_TOTAL},
};
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::{fs, process::Command, time};
use tracing::{debug, error, info};

///
/// A generated code image
///
#[derive(Clone, Debug)]
pub struct CodeImage {
    /// PNG bytes
    pub bytes: Vec<u8>,
}

///
/// Renders a record link into a scannable image.
///
#[async_trait]
pub trait CodeIssuer: Send + Sync {
    async fn issue(&self, record_id: &str, url: &str) -> Result<CodeImage, CodeIssuerError>;
}

///
/// Runs an external encoder program.
///
/// The program is called as `{program} {script} {url} {output_file} {cell_size}` and is expected
/// to write a PNG to `output_file`. It is killed if it outlives the configured timeout.
///
/// Every run writes to its own staging file, which is moved over `{output_dir}/{record_id}.png`
/// only once it has been read back. A previous image is never mistaken for new output.
///
#[derive(Clone, Debug)]
pub struct ScriptIssuer {
    config: CodeIssuerConfig,
}

impl ScriptIssuer {
    pub fn new(config: CodeIssuerConfig) -> ScriptIssuer {
        ScriptIssuer { config }
    }

    async fn run(&self, url: &str, staging_path: &Path) -> Result<Vec<u8>, CodeIssuerError> {
        if let Some(dir) = staging_path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut command = Command::new(&self.config.program);
        if !self.config.script.is_empty() {
            command.arg(&self.config.script);
        }
        command
            .arg(url)
            .arg(staging_path)
            .arg(self.config.cell_size.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            target: ISSUER,
            msg = "Running code issuer",
            program = self.config.program,
            script = self.config.script
        );

        let child = command.spawn().map_err(CodeIssuerError::Spawn)?;
        let output = time::timeout(self.config.timeout(), child.wait_with_output()).await??;

        if !output.status.success() {
            return Err(CodeIssuerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        match fs::read(staging_path).await {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Err(CodeIssuerError::MissingOutput {
                path: staging_path.display().to_string(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(CodeIssuerError::MissingOutput {
                    path: staging_path.display().to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    ///
    /// Run the encoder into a staging file and move the result into place
    ///
    async fn render(&self, record_id: &str, url: &str) -> Result<Vec<u8>, CodeIssuerError> {
        let output_path = self.config.output_path(record_id);
        let staging_path = self.config.staging_path(record_id);

        let result = match self.run(url, &staging_path).await {
            Ok(bytes) => fs::rename(&staging_path, &output_path)
                .await
                .map(|()| bytes)
                .map_err(CodeIssuerError::from),
            Err(err) => Err(err),
        };

        if result.is_err() {
            // Nothing to clean up if the encoder never wrote
            let _ = fs::remove_file(&staging_path).await;
        }

        result
    }
}

#[async_trait]
impl CodeIssuer for ScriptIssuer {
    async fn issue(&self, record_id: &str, url: &str) -> Result<CodeImage, CodeIssuerError> {
        let start = Instant::now();

        let result = self.render(record_id, url).await;

        histogram!(CODE_ISSUE_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(bytes) => {
                counter!(CODES_ISSUED_TOTAL).increment(1);
                info!(
                    target: ISSUER,
                    msg = "Code issued",
                    record_id,
                    size = bytes.len()
                );
                Ok(CodeImage { bytes })
            }
            Err(err) => {
                counter!(CODE_ISSUE_ERROR_TOTAL).increment(1);
                error!(
                    target: ISSUER,
                    msg = "Code issuer failed",
                    record_id,
                    error = err.to_string()
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct Scratch {
        dir: PathBuf,
    }

    impl Scratch {
        fn new() -> Scratch {
            let dir = std::env::temp_dir().join(format!("patient-portal-{}", Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Scratch { dir }
        }

        fn issuer(&self, script_body: &str, timeout: u64) -> ScriptIssuer {
            let script = self.dir.join("encoder.sh");
            std::fs::write(&script, script_body).unwrap();
            ScriptIssuer::new(CodeIssuerConfig {
                program: "sh".to_string(),
                script: script.display().to_string(),
                cell_size: 7,
                output_dir: self.dir.join("codes").display().to_string(),
                timeout,
            })
        }
    }

    impl Scratch {
        /// File names in the output directory, sorted
        fn codes(&self) -> Vec<String> {
            let Ok(entries) = std::fs::read_dir(self.dir.join("codes")) else {
                return Vec::new();
            };
            let mut names = entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            names.sort();
            names
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[tokio::test]
    async fn reads_back_written_image() {
        let scratch = Scratch::new();
        let issuer = scratch.issuer("printf '%s|%s' \"$1\" \"$3\" > \"$2\"\n", 5000);

        let image = issuer
            .issue("abc", "http://localhost:3000/patient/abc")
            .await
            .unwrap();

        assert_eq!(image.bytes, b"http://localhost:3000/patient/abc|7");

        let codes = scratch.codes();
        assert_eq!(codes, vec!["abc.png".to_string()]);
        assert_eq!(
            std::fs::read(scratch.dir.join("codes/abc.png")).unwrap(),
            image.bytes
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let scratch = Scratch::new();
        let issuer = scratch.issuer("echo 'no encoder here' >&2\nexit 3\n", 5000);

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        match err {
            CodeIssuerError::Failed { stderr, .. } => assert_eq!(stderr, "no encoder here"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_image_is_a_failure() {
        let scratch = Scratch::new();
        let issuer = scratch.issuer("exit 0\n", 5000);

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        assert!(matches!(err, CodeIssuerError::MissingOutput { .. }));
    }

    #[tokio::test]
    async fn previous_image_is_not_reused() {
        let scratch = Scratch::new();
        std::fs::create_dir_all(scratch.dir.join("codes")).unwrap();
        std::fs::write(scratch.dir.join("codes/abc.png"), b"old image").unwrap();

        let issuer = scratch.issuer("exit 0\n", 5000);

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        assert!(matches!(err, CodeIssuerError::MissingOutput { .. }));
        assert_eq!(scratch.codes(), vec!["abc.png".to_string()]);
    }

    #[tokio::test]
    async fn failed_run_leaves_no_staging_file() {
        let scratch = Scratch::new();
        let issuer = scratch.issuer("printf 'partial' > \"$2\"\nexit 1\n", 5000);

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        assert!(matches!(err, CodeIssuerError::Failed { .. }));
        assert!(scratch.codes().is_empty());
    }

    #[tokio::test]
    async fn slow_issuer_times_out() {
        let scratch = Scratch::new();
        let issuer = scratch.issuer("sleep 5\n", 100);

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        assert!(matches!(err, CodeIssuerError::Timeout(_)));
    }

    #[tokio::test]
    async fn missing_program_cannot_spawn() {
        let issuer = ScriptIssuer::new(CodeIssuerConfig {
            program: "/nonexistent/patient-portal-encoder".to_string(),
            output_dir: std::env::temp_dir().display().to_string(),
            ..Default::default()
        });

        let err = issuer.issue("abc", "http://x/patient/abc").await.unwrap_err();
        assert!(matches!(err, CodeIssuerError::Spawn(_)));
    }
}
