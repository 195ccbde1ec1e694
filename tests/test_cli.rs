use std::fs;

use cdp_parameter::clap::Arg;
use cdp_parameter::*;

#[derive(Default)]
struct MyParameter {
    attrs: Attributes,
}

impl Parameter for MyParameter {
    fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    fn check_values(&self) -> Result<(), ParamError> {
        Ok(())
    }
}

fn my_parser() -> ParameterCli<MyParameter> {
    ParameterCli::with_args(|cli| {
        cli.add_argument(
            Arg::new("vars")
                .short('v')
                .long("vars")
                .num_args(1..)
                .required(false)
                .help("Variables to use"),
        );
    })
}

#[test]
fn test_load_default_args() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("param_file.lua");
    fs::write(&path, "vars = {\"v1\", \"v2\"}\n").unwrap();

    let mut cli = my_parser();
    cli.add_args_and_values(["-p".into(), path.clone().into_os_string()])
        .unwrap();
    let p = cli.get_parameter_with(&mut ScriptLoader::new()).unwrap();
    assert_eq!(p.get_attr("vars"), Some(&Value::from(vec!["v1", "v2"])));
    assert_eq!(p.origin("vars"), Some(&Origin::Script(path)));
}

#[test]
fn test_load_custom_args() {
    let mut cli = my_parser();
    assert!(cli.add_args_and_values(["-v", "v1", "v2"]).is_ok());
}

#[test]
fn test_get_parameter() {
    let mut loader = ScriptLoader::new();
    let mut cli = my_parser();
    cli.add_args_and_values(["-v", "v1", "v2"]).unwrap();
    let p = cli.get_parameter_with(&mut loader).unwrap();
    assert_eq!(p.get::<Vec<String>>("vars").unwrap(), vec!["v1", "v2"]);
    assert!(loader.search_path().is_empty());
}

#[test]
fn test_command_line_overrides_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("override_params.lua");
    fs::write(&path, "vars = {\"v1\", \"v2\"}\nepochs = 3\n").unwrap();

    let mut cli = my_parser();
    cli.add_args_and_values([
        "-p".into(),
        path.into_os_string(),
        "-v".into(),
        "x".into(),
        "y".into(),
        "-D".into(),
        "epochs=5".into(),
    ])
    .unwrap();
    let p: MyParameter = cli.get_parameter_with(&mut ScriptLoader::new()).unwrap();
    assert_eq!(p.get_attr("vars"), Some(&Value::from(vec!["x", "y"])));
    assert_eq!(p.get::<i64>("epochs").unwrap(), 5);
    assert_eq!(p.origin("vars"), Some(&Origin::CommandLine));
}

#[test]
fn test_script_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("layered.json");
    let script = dir.path().join("layered_params.lua");
    fs::write(&cfg, r#"{ "epochs": 1, "rate": 0.1 }"#).unwrap();
    fs::write(&script, "epochs = 2\n").unwrap();

    let mut cli = my_parser();
    cli.add_args_and_values([
        "-c".into(),
        cfg.into_os_string(),
        "-p".into(),
        script.into_os_string(),
    ])
    .unwrap();
    let p = cli.get_parameter_with(&mut ScriptLoader::new()).unwrap();
    assert_eq!(p.get::<i64>("epochs").unwrap(), 2);
    assert_eq!(p.get::<f64>("rate").unwrap(), 0.1);
}

#[test]
fn test_missing_required_option_is_usage_error() {
    let mut cli = ParameterCli::<MyParameter>::with_args(|cli| {
        cli.add_argument(Arg::new("model").long("model").required(true));
    });
    let err = cli.add_args_and_values(Vec::<String>::new()).unwrap_err();
    assert!(err.is_usage());
    assert!(cli.matches().is_none());
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let mut cli = my_parser();
    let err = cli.add_args_and_values(["--no-such-flag"]).unwrap_err();
    assert!(matches!(err, ParamError::Usage(_)));
}

#[test]
fn test_missing_script_propagates() {
    let mut cli = my_parser();
    cli.add_args_and_values(["-p", "does_not_exist.lua"]).unwrap();
    let err = cli.get_parameter_with(&mut ScriptLoader::new()).err().unwrap();
    assert!(matches!(err, ParamError::NotFound(_)));
}

#[test]
fn test_render_parameters() {
    let mut cli = my_parser();
    cli.add_args_and_values(["-v", "v1", "v2"]).unwrap();
    let p = cli.get_parameter_with(&mut ScriptLoader::new()).unwrap();
    let text = render_parameters(&p);
    assert!(text.contains("Parameters:"));
    assert!(text.contains("[\"v1\", \"v2\"]"));
    assert!(text.contains("command line"));
}

#[test]
fn test_binary_exits_with_usage_status() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cdp-param"))
        .arg("--no-such-flag")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:"));
}

#[test]
fn test_binary_prints_loaded_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary_params.lua");
    fs::write(&path, "epochs = 3\n").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cdp-param"))
        .arg("-p")
        .arg(&path)
        .args(["-v", "v1", "v2", "--check"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("epochs"));
    assert!(stdout.contains("[\"v1\", \"v2\"]"));
}
