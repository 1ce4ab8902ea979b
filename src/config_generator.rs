//! Export of the command line as an Icinga2 `CheckCommand` object, so the plugin can describe
//! itself to the monitoring configuration.

/// Environment variable which switches the binary into config generation mode.
pub const GENERATE_ENV: &str = "GENERATE_ICINGA_COMMAND";

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    flag: String,
    var: String,
    description: Option<String>,
    is_switch: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("argument {0} has no long form")]
    MissingLongArgument(String),
}

impl CommandDescription {
    /// Renders the `CheckCommand` object for the executable at `command`. Custom variables are
    /// prefixed with `var_prefix`, e.g. `graphite_url` for the `--url` flag.
    pub fn to_icinga_command(&self, name: &str, command: &str, var_prefix: &str) -> String {
        let mut out = format!("object CheckCommand \"{name}\" {{\n");
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(command)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"--{}\" = {{\n", arg.flag));

            if arg.is_switch {
                out.push_str(&format!("      set_if = \"${}_{}$\"\n", var_prefix, arg.var));
            } else {
                out.push_str(&format!("      value = \"${}_{}$\"\n", var_prefix, arg.var));
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default_value.as_ref().map(|d| (arg, d)))
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
            for (arg, default_value) in defaults {
                out.push_str(&format!(
                    "  vars.{}_{} = \"{}\"\n",
                    var_prefix,
                    arg.var,
                    escape_string(default_value)
                ));
            }
        }

        out.push_str("}\n");
        out
    }
}

fn escape_string(s: &str) -> String {
    ["\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{}", c)))
}

impl TryFrom<&clap::Command> for CommandDescription {
    type Error = ToIcingaCommandError;

    fn try_from(cmd: &clap::Command) -> Result<Self, Self::Error> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let flag = arg
                .get_long()
                .ok_or_else(|| ToIcingaCommandError::MissingLongArgument(arg.get_id().to_string()))?
                .to_owned();

            let var = flag.replace('-', "_");
            let description = arg.get_help().map(|s| s.to_string());

            let is_switch = {
                let values = arg.get_possible_values();
                values.len() == 2
                    && values.iter().any(|v| v.get_name() == "true")
                    && values.iter().any(|v| v.get_name() == "false")
            };

            // a switch is off unless set, its "false" default means nothing to icinga
            let default_value = if is_switch {
                None
            } else {
                arg.get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(|s| s.to_string())
            };

            arguments.push(ArgumentDescription {
                flag,
                var,
                description,
                is_switch,
                default_value,
            });
        }

        Ok(CommandDescription { arguments })
    }
}

/// Prints the Icinga command configuration and exits if the [GENERATE_ENV] environment variable
/// is set, returns without doing anything otherwise.
pub fn print_icinga_command_config_if_env_and_exit(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), ToIcingaCommandError> {
    if std::env::var_os(GENERATE_ENV).is_none() {
        return Ok(());
    }

    let current_exe = std::env::current_exe()?
        .to_str()
        .ok_or(ToIcingaCommandError::InvalidExecutablePath)?
        .to_owned();

    let description = CommandDescription::try_from(cmd)?;
    let out = description.to_icinga_command(name, &current_exe, "graphite");

    println!("{}", out.trim());
    std::process::exit(0);
}
