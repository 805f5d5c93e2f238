// Helper functions shared by the extractor and the transformer

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::BridgeError;

/// Run command with timeout; the child is killed and reaped on expiry
pub async fn run_output_with_timeout<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
    timeout_secs: u64,
) -> Result<Output, BridgeError> {
    let program_name = program.to_string_lossy().to_string();

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BridgeError::Spawn {
            program: program_name.clone(),
            source,
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        std::io::Error::other(format!("Failed to capture stdout from {}", program_name))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        std::io::Error::other(format!("Failed to capture stderr from {}", program_name))
    })?;

    // The deadline covers the pipes too: a grandchild may keep them open
    // after the tool itself has exited
    let collect = async {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (status, _, _) = tokio::try_join!(
            child.wait(),
            stdout_pipe.read_to_end(&mut stdout),
            stderr_pipe.read_to_end(&mut stderr),
        )?;
        Ok::<Output, std::io::Error>(Output {
            status,
            stdout,
            stderr,
        })
    };

    let result = timeout(Duration::from_secs(timeout_secs), collect).await;
    match result {
        Ok(output) => Ok(output?),
        Err(_) => {
            tracing::warn!(program = %program_name, timeout_secs, "tool timed out, killing");
            let _ = child.kill().await;
            Err(BridgeError::Timeout {
                seconds: timeout_secs,
            })
        }
    }
}

/// Human-readable size: 512B, 1.5KB, 45.3MB, 1.25GB
pub fn format_filesize(size_bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let size = size_bytes as f64;

    if size < KIB {
        format!("{}B", size_bytes)
    } else if size < KIB * KIB {
        format!("{:.1}KB", size / KIB)
    } else if size < KIB * KIB * KIB {
        format!("{:.1}MB", size / (KIB * KIB))
    } else {
        format!("{:.2}GB", size / (KIB * KIB * KIB))
    }
}
