//! Job file subcommands.

use log::info;
use wise_client::{ClientError, JobClient, JobStart, ServerConfig};
use wise_core::{Validate, ValidationError, Wise};

fn load(path: &str) -> anyhow::Result<Wise> {
    let job = Wise::from_json_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load job {}: {}", path, e))?;
    info!(
        "Loaded job {} with {} scenarios",
        path,
        job.inputs.scenarios.len()
    );
    Ok(job)
}

fn print_errors(errors: &[ValidationError]) {
    for error in errors {
        for (path, message) in error.flatten() {
            println!("{path}: {message}");
        }
    }
}

/// Print every validation problem in a job file.
pub fn run_validate(path: &str) -> anyhow::Result<()> {
    let job = load(path)?;
    let errors = job.check_valid();
    if errors.is_empty() {
        println!("{path} is valid");
        return Ok(());
    }
    print_errors(&errors);
    anyhow::bail!("{} has {} validation errors", path, errors.len())
}

/// Print the records a job file would send, one line each.
pub fn run_render(path: &str) -> anyhow::Result<()> {
    let job = load(path)?;
    print!("{}", job.render().render());
    Ok(())
}

pub async fn run_submit(config: ServerConfig, path: &str, validate_only: bool) -> anyhow::Result<()> {
    let job = load(path)?;
    let start = if validate_only {
        JobStart::ValidateOnly
    } else {
        JobStart::Run
    };
    let client = JobClient::new(config);
    let pending = match client.submit(&job, start) {
        Ok(pending) => pending,
        Err(ClientError::InvalidJob(errors)) => {
            print_errors(&errors);
            anyhow::bail!("{} was not submitted: {} validation errors", path, errors.len());
        }
        Err(e) => return Err(e.into()),
    };
    let name = pending.await?;
    println!("{name}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_empty_job() {
        let path = std::env::temp_dir().join("wise-cmd-empty-job.json");
        std::fs::write(&path, "{}").unwrap();
        let result = run_validate(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_job_file() {
        assert!(run_render("/nonexistent/wise-job.json").is_err());
    }
}
