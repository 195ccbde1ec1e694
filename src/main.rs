use anyhow::Result;
use cdp_parameter::clap::{Arg, ArgAction};
use cdp_parameter::{
    exit_on_usage_error, render_parameters, Attributes, ParamError, Parameter, ParameterCli,
};
use tracing_subscriber::EnvFilter;

/// Parameters of the demo command: anything the script defines, plus `vars`.
#[derive(Default)]
struct DemoParameter {
    attrs: Attributes,
}

impl Parameter for DemoParameter {
    fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    fn check_values(&self) -> Result<(), ParamError> {
        if self.get_attr("vars").is_some() {
            let vars: Vec<String> = self.get("vars")?;
            if vars.iter().any(|v| v.is_empty()) {
                return Err(ParamError::invalid("vars", "variable names cannot be empty"));
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cli = ParameterCli::<DemoParameter>::with_args(|cli| {
        cli.name(env!("CARGO_BIN_NAME"))
            .add_argument(
                Arg::new("vars")
                    .short('v')
                    .long("vars")
                    .num_args(1..)
                    .help("Variables to use"),
            )
            .add_argument(
                Arg::new("check")
                    .long("check")
                    .action(ArgAction::SetTrue)
                    .help("Validate the parameter before printing it"),
            );
    });
    exit_on_usage_error(cli.add_args_and_values(std::env::args_os().skip(1)))?;

    let parameter = cli.get_parameter()?;
    let parameter = if parameter.get_or_else("check", false) {
        parameter.validated()?
    } else {
        parameter
    };
    println!("{}", render_parameters(&parameter));
    Ok(())
}
