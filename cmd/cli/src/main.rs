use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use clap::Parser;
use sqs_poller::{Config, Deadline, Handler, HandlerError, Message, Worker};
use std::time::Duration;
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

/// Polls an SQS queue and runs the specified command for every message
#[derive(Debug, Parser)]
struct Cli {
    /// SQS Endpoint URL
    #[arg(short('E'), long, env = "SQS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// SQS Queue name
    #[arg(short('Q'), long, env = "SQS_QUEUE_NAME")]
    queue_name: String,

    /// Maximum number of messages per receive (0 uses the default of 10)
    #[arg(short('n'), long, default_value_t = 0)]
    max_number_of_messages: i32,

    /// Long-poll wait in seconds (0 uses the default of 20)
    #[arg(short('w'), long, default_value_t = 0)]
    wait_time_seconds: i32,

    /// Upper bound in seconds on any single SQS call
    #[arg(long)]
    call_timeout_seconds: Option<u64>,

    /// Exit code of the command that marks a message as invalid; such
    /// messages are deleted instead of retried
    #[arg(long)]
    reject_exit_code: Option<i32>,

    /// exec arguments. Use {}.messageId and {}.body to get the message
    #[arg(short, long, num_args = 1.., allow_hyphen_values = true)]
    exec: Vec<String>,
}

/// Runs `exec` for each message, or logs the body when there is nothing to run.
struct ExecHandler {
    exec: Vec<String>,
    reject_exit_code: Option<i32>,
}

impl ExecHandler {
    fn command(&self, message: &Message) -> Option<Command> {
        let (program, args) = self.exec.split_first()?;

        let mut cmd = Command::new(program);
        for arg in args {
            match arg.as_str() {
                "{}.messageId" => {
                    if let Some(val) = &message.message_id {
                        cmd.arg(val);
                    }
                }
                "{}.body" => {
                    cmd.arg(&message.body);
                }
                _ => {
                    cmd.arg(arg);
                }
            }
        }
        Some(cmd)
    }
}

impl Handler for ExecHandler {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        let Some(mut cmd) = self.command(message) else {
            tracing::info!(message_id = ?message.message_id, body = %message.body, "received message");
            return Ok(());
        };

        let output = cmd.output().await.map_err(HandlerError::failed)?;
        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "command finished"
        );

        match output.status.code() {
            Some(0) => Ok(()),
            code if code.is_some() && code == self.reject_exit_code => Err(HandlerError::rejected(
                message.message_id.clone().unwrap_or_default(),
                format!("command exited with {}", output.status),
            )),
            _ => Err(HandlerError::failed(format!(
                "command exited with {}",
                output.status
            ))),
        }
    }
}

async fn run<Q>(client: Q, config: Config, handler: ExecHandler) -> anyhow::Result<()>
where
    Q: sqs_poller::QueueClient + Send + Sync + 'static,
{
    let worker = Worker::new(client, config)
        .await
        .context("failed to create worker")?;
    tracing::info!(queue_url = worker.config().queue_url(), "polling queue");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    worker.with_graceful_shutdown(handler, shutdown).await;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();
    tracing::debug!(?args, "parsed arguments");

    let mut loader = aws_config::defaults(BehaviorVersion::v2023_11_09());
    if let Some(endpoint_url) = &args.endpoint_url {
        loader = loader.endpoint_url(endpoint_url)
    }
    let aws_config = loader.load().await;
    let client = Client::new(&aws_config);

    let config = Config::new(&args.queue_name)
        .with_max_number_of_messages(args.max_number_of_messages)
        .with_wait_time_seconds(args.wait_time_seconds);
    let handler = ExecHandler {
        exec: args.exec,
        reject_exit_code: args.reject_exit_code,
    };

    match args.call_timeout_seconds {
        Some(secs) => run(Deadline::new(client, Duration::from_secs(secs)), config, handler).await,
        None => run(client, config, handler).await,
    }
}
