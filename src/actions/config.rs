use crate::{
    actions::{
        utils::{output_format, print_formatted, report_success},
        CliActionError,
    },
    commands::params::{
        CONFIG_KEY_OUTPUT_FORMAT, CONFIG_KEY_TIMEOUT, PARAMETER_KEY, PARAMETER_VALUE,
    },
    configuration::{Configuration, ConfigurationError},
};
use clap::ArgMatches;
use tracing::trace;

pub fn print_configuration_path() -> Result<(), CliActionError> {
    let path = Configuration::get_default_configuration_file_path()?;
    println!("{}", path.display());
    Ok(())
}

pub fn show_configuration(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    trace!("Executing \"config show\"...");
    let configuration = Configuration::load_or_create_default()?;
    let format = output_format(sub_matches, &configuration)?;
    let path = Configuration::get_default_configuration_file_path()?;
    print_formatted(&configuration.summary(Some(path)), &format)
}

/// Apply `config set <key> <value>` to a configuration.
pub fn apply_setting(
    configuration: &mut Configuration,
    key: &str,
    value: &str,
) -> Result<(), ConfigurationError> {
    match key {
        CONFIG_KEY_OUTPUT_FORMAT => configuration.set_output_format(value),
        CONFIG_KEY_TIMEOUT => configuration.set_timeout_secs(value),
        _ => Err(ConfigurationError::InvalidPropertyValue {
            name: "key".to_string(),
            value: key.to_string(),
        }),
    }
}

pub fn set_configuration_value(sub_matches: &ArgMatches) -> Result<(), CliActionError> {
    let key = sub_matches
        .get_one::<String>(PARAMETER_KEY)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_KEY.to_string()))?;
    let value = sub_matches
        .get_one::<String>(PARAMETER_VALUE)
        .ok_or_else(|| CliActionError::MissingRequiredArgument(PARAMETER_VALUE.to_string()))?;

    let mut configuration = Configuration::load_or_create_default()?;
    apply_setting(&mut configuration, key, value)?;
    configuration.save_to_default()?;
    report_success(&format!("Set {} to {}", key, value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_setting() {
        let mut configuration = Configuration::default();
        apply_setting(&mut configuration, "output-format", "CSV").unwrap();
        assert_eq!(configuration.output_format(), "csv");

        apply_setting(&mut configuration, "timeout", "15").unwrap();
        assert_eq!(configuration.timeout_secs(), 15);

        assert!(apply_setting(&mut configuration, "color", "always").is_err());
        assert!(apply_setting(&mut configuration, "timeout", "-1").is_err());
    }
}
