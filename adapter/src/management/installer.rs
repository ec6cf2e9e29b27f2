//! Delegation of binary install/update to an external package installer.

use crate::error::{AdapterError, AdapterResult};
use crate::management::comm::ProcessHandle;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;

lazy_static! {
    static ref LOCAL_BUILD_PATTERN: Regex =
        Regex::new(r#""buildid"\s+"(\d+)""#).expect("Failed to compile LOCAL_BUILD_PATTERN regex");
    static ref REMOTE_BUILD_PATTERN: Regex =
        Regex::new(r#"(?s)"branches"\s*\{\s*"public"\s*\{[^}]*?"buildid"\s+"(\d+)""#)
            .expect("Failed to compile REMOTE_BUILD_PATTERN regex");
}

/// Result of handing an install or update to the installer. Both fields may
/// be set at once: the tool started but reported a problem.
#[derive(Default)]
pub struct InstallerOutcome {
    pub process: Option<ProcessHandle>,
    pub error: Option<String>,
}

impl InstallerOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        InstallerOutcome {
            process: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, install_root: &Path, extra_args: &str, package_id: &str)
        -> InstallerOutcome;

    async fn update(
        &self,
        install_root: &Path,
        package_id: &str,
        validate: bool,
        custom: Option<&str>,
    ) -> InstallerOutcome;

    async fn local_build(&self, install_root: &Path, package_id: &str) -> AdapterResult<String>;

    async fn remote_build(&self, package_id: &str) -> AdapterResult<String>;
}

/// [`PackageInstaller`] backed by the SteamCMD command line client, logged
/// in anonymously.
#[derive(Debug, Clone)]
pub struct SteamCmd {
    executable: PathBuf,
}

impl SteamCmd {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        SteamCmd {
            executable: executable.into(),
        }
    }

    fn install_args(
        install_root: &Path,
        extra_args: &str,
        package_id: &str,
    ) -> AdapterResult<Vec<String>> {
        let mut args = Self::login_args(Some(install_root));
        args.push("+app_update".into());
        args.push(package_id.into());
        args.extend(split_words(extra_args)?);
        args.push("validate".into());
        args.push("+quit".into());
        Ok(args)
    }

    fn update_args(
        install_root: &Path,
        package_id: &str,
        validate: bool,
        custom: Option<&str>,
    ) -> AdapterResult<Vec<String>> {
        let mut args = Self::login_args(Some(install_root));
        args.push("+app_update".into());
        args.push(package_id.into());
        if let Some(custom) = custom {
            args.extend(split_words(custom)?);
        }
        if validate {
            args.push("validate".into());
        }
        args.push("+quit".into());
        Ok(args)
    }

    fn login_args(install_root: Option<&Path>) -> Vec<String> {
        let mut args = vec![];
        if let Some(root) = install_root {
            args.push("+force_install_dir".into());
            args.push(root.to_string_lossy().to_string());
        }
        args.push("+login".into());
        args.push("anonymous".into());
        args
    }

    fn check_executable(&self) -> AdapterResult<()> {
        if self.executable.is_file() {
            Ok(())
        } else {
            Err(AdapterError::Installer(format!(
                "steamcmd not found ({})",
                self.executable.display()
            )))
        }
    }

    async fn run(&self, install_root: &Path, args: Vec<String>) -> InstallerOutcome {
        if let Err(err) = self.check_executable() {
            return InstallerOutcome::failed(err.to_string());
        }
        if let Err(err) = tokio::fs::create_dir_all(install_root).await {
            return InstallerOutcome::failed(format!(
                "could not create {}: {}",
                install_root.display(),
                err
            ));
        }

        debug!("running steamcmd {}", args.join(" "));
        match Command::new(&self.executable)
            .args(&args)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => InstallerOutcome {
                process: Some(ProcessHandle::from_child(child)),
                error: None,
            },
            Err(err) => InstallerOutcome::failed(format!("steamcmd could not start: {}", err)),
        }
    }
}

#[async_trait]
impl PackageInstaller for SteamCmd {
    async fn install(
        &self,
        install_root: &Path,
        extra_args: &str,
        package_id: &str,
    ) -> InstallerOutcome {
        info!("installing app {} into {}", package_id, install_root.display());
        match Self::install_args(install_root, extra_args, package_id) {
            Ok(args) => self.run(install_root, args).await,
            Err(err) => InstallerOutcome::failed(err.to_string()),
        }
    }

    async fn update(
        &self,
        install_root: &Path,
        package_id: &str,
        validate: bool,
        custom: Option<&str>,
    ) -> InstallerOutcome {
        info!("updating app {} in {}", package_id, install_root.display());
        match Self::update_args(install_root, package_id, validate, custom) {
            Ok(args) => self.run(install_root, args).await,
            Err(err) => InstallerOutcome::failed(err.to_string()),
        }
    }

    async fn local_build(&self, install_root: &Path, package_id: &str) -> AdapterResult<String> {
        let manifest = format!("appmanifest_{package_id}.acf");
        let path = install_root.join("steamapps").join(&manifest);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| AdapterError::Installer(format!("{manifest} is missing.")))?;
        parse_local_build(&content).ok_or_else(|| {
            AdapterError::Installer(format!("Fail to get local build from {manifest}"))
        })
    }

    async fn remote_build(&self, package_id: &str) -> AdapterResult<String> {
        self.check_executable()?;

        let mut args = Self::login_args(None);
        args.extend([
            "+app_info_update".to_owned(),
            "1".to_owned(),
            "+app_info_print".to_owned(),
            package_id.to_owned(),
            "+quit".to_owned(),
        ]);
        let output = Command::new(&self.executable)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| AdapterError::Installer(format!("steamcmd could not start: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_remote_build(&stdout).ok_or_else(|| {
            warn!("no public build id in app_info_print output of {}", package_id);
            AdapterError::Installer(format!("Fail to get remote build of app {package_id}"))
        })
    }
}

fn split_words(args: &str) -> AdapterResult<Vec<String>> {
    shell_words::split(args)
        .map_err(|err| AdapterError::Installer(format!("bad steamcmd arguments `{args}`: {err}")))
}

fn parse_local_build(manifest: &str) -> Option<String> {
    LOCAL_BUILD_PATTERN
        .captures(manifest)
        .map(|caps| caps[1].to_owned())
}

fn parse_remote_build(app_info: &str) -> Option<String> {
    REMOTE_BUILD_PATTERN
        .captures(app_info)
        .map(|caps| caps[1].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const APP_MANIFEST: &str = r#""AppState"
{
	"appid"		"2278520"
	"name"		"Enshrouded Dedicated Server"
	"buildid"		"13579246"
	"LastOwner"		"0"
}"#;

    const APP_INFO: &str = r#""2278520"
{
	"depots"
	{
		"branches"
		{
			"public"
			{
				"buildid"		"14000001"
				"timeupdated"		"1700000000"
			}
			"experimental"
			{
				"buildid"		"14000002"
			}
		}
	}
}"#;

    #[test]
    fn test_install_args() {
        let args = SteamCmd::install_args(Path::new("/srv/1"), "", "2278520").unwrap();
        assert_eq!(
            args,
            vec![
                "+force_install_dir",
                "/srv/1",
                "+login",
                "anonymous",
                "+app_update",
                "2278520",
                "validate",
                "+quit",
            ]
        );
    }

    #[test]
    fn test_update_args() {
        let plain = SteamCmd::update_args(Path::new("/srv/1"), "2278520", false, None).unwrap();
        assert!(!plain.contains(&"validate".to_string()));
        assert_eq!(plain.last().unwrap(), "+quit");

        let custom =
            SteamCmd::update_args(Path::new("/srv/1"), "2278520", true, Some("-beta experimental"))
                .unwrap();
        assert_eq!(
            &custom[4..],
            &["+app_update", "2278520", "-beta", "experimental", "validate", "+quit"]
        );
    }

    #[test]
    fn test_quoted_custom_args() {
        let custom = SteamCmd::update_args(
            Path::new("/srv/1"),
            "2278520",
            false,
            Some(r#"-beta "public test" -betapassword 'a b'"#),
        )
        .unwrap();
        assert_eq!(
            &custom[6..],
            &["-beta", "public test", "-betapassword", "a b", "+quit"]
        );

        let install =
            SteamCmd::install_args(Path::new("/srv/1"), r#"-beta "x y""#, "2278520").unwrap();
        assert_eq!(&install[6..8], &["-beta", "x y"]);

        assert!(SteamCmd::update_args(Path::new("/srv/1"), "2278520", false, Some("\"oops"))
            .is_err());
    }

    #[test]
    fn test_parse_builds() {
        assert_eq!(parse_local_build(APP_MANIFEST).as_deref(), Some("13579246"));
        assert_eq!(parse_remote_build(APP_INFO).as_deref(), Some("14000001"));
        assert_eq!(parse_remote_build("no branches here"), None);
    }

    #[tokio::test]
    async fn test_local_build_reads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let steamcmd = SteamCmd::new(dir.path().join("steamcmd"));

        let missing = steamcmd.local_build(dir.path(), "2278520").await;
        assert_eq!(
            missing.unwrap_err().to_string(),
            "appmanifest_2278520.acf is missing."
        );

        std::fs::create_dir_all(dir.path().join("steamapps")).unwrap();
        std::fs::write(
            dir.path().join("steamapps").join("appmanifest_2278520.acf"),
            APP_MANIFEST,
        )
        .unwrap();
        let build = steamcmd.local_build(dir.path(), "2278520").await;
        assert_eq!(build.unwrap(), "13579246");
    }

    #[tokio::test]
    async fn test_missing_steamcmd_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let steamcmd = SteamCmd::new(dir.path().join("steamcmd"));

        let outcome = steamcmd.install(dir.path(), "", "2278520").await;
        assert!(outcome.process.is_none());
        assert!(outcome.error.unwrap().starts_with("steamcmd not found"));

        assert!(steamcmd.remote_build("2278520").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remote_build_from_fake_steamcmd() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let info_path = dir.path().join("app_info.txt");
        std::fs::write(&info_path, APP_INFO).unwrap();
        let script = dir.path().join("steamcmd");
        std::fs::write(
            &script,
            format!("#!/bin/sh\ncat '{}'\n", info_path.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let steamcmd = SteamCmd::new(script);
        assert_eq!(steamcmd.remote_build("2278520").await.unwrap(), "14000001");
    }
}
