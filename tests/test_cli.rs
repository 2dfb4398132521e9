mod fixtures;

use anyhow::Result;
use fixtures::*;
use rstest::*;

#[rstest]
fn test_cli(mut jail: JailManager) -> Result<()> {
    assert!(jail.pass(&["--version"]));
    assert!(jail.pass(&["--help"]));
    assert!(jail.last_stdout.contains("--target"));
    assert!(jail.xfail(&["--bad-option"]));
    assert!(jail.xfail(&["-t", "/tmp/a", "-t", "/tmp/b", "--", "true"]));
    Ok(())
}

#[rstest]
fn test_config_from_cli(mut jail: JailManager) -> Result<()> {
    let target = jail.mkdir("scratch");
    let target = target.to_str().unwrap();

    assert!(jail.pass(&["--no-config", "-t", target, "config", "target"]));
    assert_eq!(jail.last_stdout.trim(), target);

    assert!(jail.pass(&["--no-config", "-u", "-c", "config"]));
    assert!(jail.last_stdout.contains("no_home=true"));
    assert!(jail.last_stdout.contains("no_chroot=true"));
    assert!(jail.last_stdout.contains("overlay_helper=fuse-overlayfs"));
    assert!(jail.last_stdout.contains("unmount_helper=fusermount"));
    assert!(jail.last_stdout.contains("log_level=info"));

    assert!(jail.pass(&["--no-config", "--log-level=warn", "config", "log_level"]));
    assert_eq!(jail.last_stdout.trim(), "warn");

    assert!(jail.xfail(&["--no-config", "config", "name"]));
    assert!(jail.last_stderr.contains("Unknown key: name"));
    Ok(())
}

#[rstest]
fn test_config_binds(mut jail: JailManager) -> Result<()> {
    let a = jail.mkdir("a").canonicalize()?;
    let b = jail.mkdir("b").canonicalize()?;
    let binds = format!("{},{}", a.display(), b.display());

    assert!(jail.pass(&["--no-config", "-b", &binds, "config", "bind"]));
    assert_eq!(jail.last_stdout.trim(), binds);

    // environment and command line binds add up
    jail.set_env("COWJAIL_BIND", a.to_str().unwrap());
    assert!(jail.pass(&["--no-config", "-b", b.to_str().unwrap(), "config", "bind"]));
    assert_eq!(jail.last_stdout.trim(), binds);
    Ok(())
}

#[rstest]
fn test_config_from_env(mut jail: JailManager) -> Result<()> {
    jail.set_env("COWJAIL_TARGET", "/srv/jails");
    jail.set_env("COWJAIL_NO_HOME", "yes");
    assert!(jail.pass(&["--no-config", "config"]));
    assert!(jail.last_stdout.contains("target=/srv/jails"));
    assert!(jail.last_stdout.contains("no_home=true"));

    // command line wins
    assert!(jail.pass(&["--no-config", "-t", "/srv/other", "config", "target"]));
    assert_eq!(jail.last_stdout.trim(), "/srv/other");

    jail.set_env("COWJAIL_LOG_LEVEL", "foobar");
    assert!(jail.xfail(&["--no-config", "config"]));
    assert!(jail.last_stderr.contains("Invalid log level: foobar"));
    Ok(())
}

#[rstest]
fn test_config_from_file(mut jail: JailManager) -> Result<()> {
    let project = jail.mkdir("project");
    std::fs::write(
        project.join(".cowjail.toml"),
        "target = \"/srv/from-file\"\nno_chroot = true\nlog_level = \"debug\"\n",
    )?;
    jail.cwd = Some(project.clone());

    assert!(jail.pass(&["config"]));
    assert!(jail.last_stdout.contains("target=/srv/from-file"));
    assert!(jail.last_stdout.contains("no_chroot=true"));
    assert!(jail.last_stdout.contains("log_level=debug"));
    assert!(jail.last_stderr.contains(".cowjail.toml"));

    // ignored entirely with --no-config
    assert!(jail.pass(&["--no-config", "config", "target"]));
    assert_eq!(jail.last_stdout.trim(), "");

    std::fs::write(project.join(".cowjail.toml"), "net = \"none\"\n")?;
    assert!(jail.xfail(&["config"]));
    assert!(jail.last_stderr.contains("Failed to parse config file"));
    Ok(())
}
