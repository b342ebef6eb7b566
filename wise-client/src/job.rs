use crate::{
    config::ServerConfig,
    error::{ClientError, Result},
    protocol::{Completion, Request, WireClient},
};
use log::info;
use std::{future::Future, io, pin::Pin};
use wise_core::{Validate, Wise};

pub const BEGIN_DATA: &str = "BEGINDATA";
pub const END_DATA: &str = "ENDDATA";
pub const START_JOB: &str = "STARTJOB";
pub const START_JOB_VALIDATE: &str = "STARTJOB_VALIDATE";

/// What the Builder does once it has the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStart {
    #[default]
    Run,
    /// Only check the job on the Builder side.
    ValidateOnly,
}

impl JobStart {
    fn command(self) -> &'static str {
        match self {
            JobStart::Run => START_JOB,
            JobStart::ValidateOnly => START_JOB_VALIDATE,
        }
    }
}

/// Resolves to the job name the Builder assigned.
pub type PendingJob = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// The exchange that uploads `job` and starts it.
pub fn job_request(job: &Wise, start: JobStart) -> Request {
    let mut lines = job.render().lines();
    lines.push(END_DATA.to_string());
    lines.push(start.command().to_string());
    Request::new(BEGIN_DATA, lines, Completion::FirstChunk)
}

pub struct JobClient {
    client: WireClient,
}

impl JobClient {
    pub fn new(config: ServerConfig) -> Self {
        JobClient {
            client: WireClient::new(config),
        }
    }

    pub fn from_global() -> Self {
        JobClient {
            client: WireClient::from_global(),
        }
    }

    pub fn wire(&self) -> &WireClient {
        &self.client
    }

    /// Validate and upload a job.
    ///
    /// Validation runs before this returns, so an invalid job never opens a
    /// connection.
    pub fn submit(&self, job: &Wise, start: JobStart) -> Result<PendingJob> {
        let errors = job.check_valid();
        if !errors.is_empty() {
            return Err(ClientError::InvalidJob(errors));
        }
        let request = job_request(job, start);
        info!("Submitting job with {} lines", request.lines.len());
        let pending = self.client.send(request)?;
        Ok(Box::pin(async move {
            let response = pending.await?;
            let name = response.body.trim().to_string();
            if name.is_empty() {
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Builder did not return a job name",
                )));
            }
            info!("Builder accepted job {name}");
            Ok(name)
        }))
    }
}
