use assert_cmd::Command;

pub fn snipgen_cmd() -> Command {
	let mut cmd = Command::cargo_bin("snipgen").expect("snipgen binary should build");
	cmd.env("NO_COLOR", "1");
	cmd
}
