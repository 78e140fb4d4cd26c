use crate::errors::{ParseError, Result, SshError, UtilsError};
use crate::parsers::SshTarget;
use lium_core::utils::is_env_key;
use lium_core::ExecResult;
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// One line of output from a streamed remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    Stdout(String),
    Stderr(String),
}

/// Direction and flags for an rsync transfer
#[derive(Debug, Clone, Default)]
pub struct RsyncOptions {
    pub download: bool,
    pub delete: bool,
    pub dry_run: bool,
    pub excludes: Vec<String>,
}

/// Single-quote a value for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}

/// Prefix `command` with `export` statements for `env`. Keys are sorted and
/// must be shell identifiers.
pub fn prepare_command(command: &str, env: &HashMap<String, String>) -> Result<String> {
    if env.is_empty() {
        return Ok(command.to_string());
    }
    let mut keys: Vec<&String> = env.keys().collect();
    keys.sort();
    if let Some(bad) = keys.iter().find(|k| !is_env_key(k)) {
        return Err(UtilsError::Parse(ParseError::InvalidFormat(format!(
            "Invalid environment variable name: '{}'",
            bad
        ))));
    }
    let exports: Vec<String> = keys
        .into_iter()
        .map(|k| format!("export {}={}", k, shell_quote(&env[k])))
        .collect();
    Ok(format!("{} && {}", exports.join(" && "), command))
}

fn ssh_option_args(private_key_path: &Path) -> Vec<String> {
    vec![
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-o".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "-o".to_string(),
        "LogLevel=ERROR".to_string(),
        "-i".to_string(),
        private_key_path.display().to_string(),
    ]
}

fn ssh_command(target: &SshTarget, private_key_path: &Path) -> Command {
    let mut cmd = Command::new("ssh");
    cmd.args(ssh_option_args(private_key_path))
        .arg("-p")
        .arg(target.port.to_string())
        .arg(target.destination());
    cmd
}

fn spawn_error(program: &str, e: std::io::Error) -> UtilsError {
    if e.kind() == std::io::ErrorKind::NotFound {
        UtilsError::Process(format!("'{}' is not installed or not on PATH", program))
    } else {
        UtilsError::Ssh(SshError::CommandFailed(format!(
            "Failed to execute {}: {}",
            program, e
        )))
    }
}

/// Run `command` on the remote host and capture its output.
pub async fn run_remote_command(
    target: &SshTarget,
    private_key_path: &Path,
    command: &str,
    env: &HashMap<String, String>,
) -> Result<ExecResult> {
    let final_command = prepare_command(command, env)?;
    debug!("ssh {} -p {}: {}", target.destination(), target.port, command);

    let output = ssh_command(target, private_key_path)
        .arg(final_command)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error("ssh", e))?;

    let exit_code = output.status.code().unwrap_or(-1);
    // 255 is ssh's own failure code
    if exit_code == 255 {
        return Err(UtilsError::Ssh(SshError::ConnectionFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )));
    }

    Ok(ExecResult::new(
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    ))
}

/// Run `command` remotely, handing each output line to `on_chunk` as it arrives.
/// Returns the remote exit code.
pub async fn stream_remote_command<F>(
    target: &SshTarget,
    private_key_path: &Path,
    command: &str,
    env: &HashMap<String, String>,
    mut on_chunk: F,
) -> Result<i32>
where
    F: FnMut(OutputChunk),
{
    let final_command = prepare_command(command, env)?;
    debug!("ssh (stream) {}: {}", target.destination(), command);

    let mut child = ssh_command(target, private_key_path)
        .arg(final_command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error("ssh", e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SshError::CommandFailed("stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SshError::CommandFailed("stderr not captured".to_string()))?;

    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();
    let (mut out_done, mut err_done) = (false, false);

    while !(out_done && err_done) {
        tokio::select! {
            line = out_lines.next_line(), if !out_done => match line? {
                Some(line) => on_chunk(OutputChunk::Stdout(line)),
                None => out_done = true,
            },
            line = err_lines.next_line(), if !err_done => match line? {
                Some(line) => on_chunk(OutputChunk::Stderr(line)),
                None => err_done = true,
            },
        }
    }

    let status = child.wait().await?;
    Ok(status.code().unwrap_or(-1))
}

/// Interactive shell with the terminal attached. Returns ssh's exit code.
pub async fn interactive_session(target: &SshTarget, private_key_path: &Path) -> Result<i32> {
    let status = ssh_command(target, private_key_path)
        .arg("-t")
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| spawn_error("ssh", e))?;

    Ok(status.code().unwrap_or(-1))
}

async fn run_scp(
    target: &SshTarget,
    private_key_path: &Path,
    source: String,
    destination: String,
    recursive: bool,
) -> Result<()> {
    let mut cmd = Command::new("scp");
    cmd.args(ssh_option_args(private_key_path))
        .arg("-P")
        .arg(target.port.to_string());
    if recursive {
        cmd.arg("-r");
    }
    debug!("scp {} -> {}", source, destination);

    let output = cmd
        .arg(source)
        .arg(destination)
        .output()
        .await
        .map_err(|e| spawn_error("scp", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UtilsError::Ssh(SshError::TransferFailed(format!(
            "scp failed: {}",
            stderr.trim()
        ))));
    }
    Ok(())
}

pub async fn scp_upload(
    target: &SshTarget,
    private_key_path: &Path,
    local_path: &Path,
    remote_path: &str,
    recursive: bool,
) -> Result<()> {
    run_scp(
        target,
        private_key_path,
        local_path.display().to_string(),
        format!("{}:{}", target.destination(), remote_path),
        recursive,
    )
    .await
}

pub async fn scp_download(
    target: &SshTarget,
    private_key_path: &Path,
    remote_path: &str,
    local_path: &Path,
    recursive: bool,
) -> Result<()> {
    run_scp(
        target,
        private_key_path,
        format!("{}:{}", target.destination(), remote_path),
        local_path.display().to_string(),
        recursive,
    )
    .await
}

/// The `-e` transport string handed to rsync
pub fn rsync_ssh_transport(target: &SshTarget, private_key_path: &Path) -> String {
    format!(
        "ssh -i {} -p {} -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
        private_key_path.display(),
        target.port
    )
}

/// Build the full rsync argument list (without the program name).
pub fn rsync_args(
    target: &SshTarget,
    private_key_path: &Path,
    local: &str,
    remote: &str,
    options: &RsyncOptions,
) -> Vec<String> {
    let mut args = vec!["-avz".to_string()];
    if options.delete {
        args.push("--delete".to_string());
    }
    if options.dry_run {
        args.push("--dry-run".to_string());
    }
    for pattern in &options.excludes {
        args.push(format!("--exclude={}", pattern));
    }
    args.push("-e".to_string());
    args.push(rsync_ssh_transport(target, private_key_path));

    let remote_spec = format!("{}:{}", target.destination(), remote);
    if options.download {
        args.push(remote_spec);
        args.push(local.to_string());
    } else {
        args.push(local.to_string());
        args.push(remote_spec);
    }
    args
}

pub async fn rsync(
    target: &SshTarget,
    private_key_path: &Path,
    local: &str,
    remote: &str,
    options: &RsyncOptions,
) -> Result<()> {
    if !command_exists("rsync") {
        return Err(UtilsError::Process(
            "rsync is not installed. Install it with your package manager".to_string(),
        ));
    }

    let args = rsync_args(target, private_key_path, local, remote, options);
    debug!("rsync {}", args.join(" "));

    let output = Command::new("rsync")
        .args(&args)
        .output()
        .await
        .map_err(|e| spawn_error("rsync", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UtilsError::Ssh(SshError::TransferFailed(format!(
            "rsync failed: {}",
            stderr.trim()
        ))));
    }
    Ok(())
}

/// Create `remote_path` (and parents) on the pod.
pub async fn ensure_remote_directory(
    target: &SshTarget,
    private_key_path: &Path,
    remote_path: &str,
) -> Result<()> {
    let command = format!("mkdir -p {}", shell_quote(remote_path));
    let result = run_remote_command(target, private_key_path, &command, &HashMap::new()).await?;

    if !result.success {
        return Err(UtilsError::Ssh(SshError::CommandFailed(format!(
            "Failed to create remote directory {}: {}",
            remote_path,
            result.stderr.trim()
        ))));
    }
    Ok(())
}

/// Insert `-i <key>` after the leading `ssh` of a connect string.
pub fn ssh_command_with_key(ssh_cmd: &str, private_key_path: &Path) -> String {
    let key = private_key_path.display();
    match ssh_cmd.trim_start().strip_prefix("ssh ") {
        Some(rest) => format!("ssh -i {} {}", key, rest),
        None => ssh_cmd.to_string(),
    }
}

pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Resolve a private key path, checking it exists.
pub fn require_private_key(path: Option<&Path>) -> Result<&Path> {
    let path = path.ok_or_else(|| {
        SshError::KeyError("No SSH private key configured. Run 'lium init'".to_string())
    })?;
    if !path.exists() {
        return Err(UtilsError::Ssh(SshError::KeyError(format!(
            "SSH private key not found at {}",
            path.display()
        ))));
    }
    Ok(path)
}
