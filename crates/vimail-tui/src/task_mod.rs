use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use vimail_core::{MailError, MailService, Message};

pub(crate) const COMPLETION_QUEUE_CAPACITY: usize = 64;

/// Validated outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Submission {
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) body: String,
}

/// Follow-up work emitted by an update; runs off the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Task {
    LoadInbox { limit: usize },
    Send(Submission),
}

/// Result of a [`Task`], fed back into the loop as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Completion {
    InboxLoaded(Result<Vec<Message>, MailError>),
    SendFinished(Result<(), MailError>),
}

pub(crate) async fn run_task(service: &dyn MailService, task: Task) -> Completion {
    match task {
        Task::LoadInbox { limit } => {
            debug!(limit, "task list_inbox");
            Completion::InboxLoaded(service.list_inbox(limit).await)
        }
        Task::Send(submission) => {
            debug!(to = %submission.to, "task send");
            Completion::SendFinished(
                service
                    .send(&submission.to, &submission.subject, &submission.body)
                    .await,
            )
        }
    }
}

pub(crate) fn spawn_tasks(
    runtime: &Handle,
    service: &Arc<dyn MailService>,
    completions: &mpsc::Sender<Completion>,
    tasks: Vec<Task>,
) {
    for task in tasks {
        let service = service.clone();
        let tx = completions.clone();
        runtime.spawn(async move {
            let completion = run_task(service.as_ref(), task).await;
            if tx.send(completion).await.is_err() {
                debug!("completion dropped, event loop gone");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vimail_core::{DemoMailService, MailError, MailService};

    use super::{Completion, Submission, Task, run_task, spawn_tasks};

    #[tokio::test]
    async fn load_inbox_task_reports_messages() {
        let service = DemoMailService::seeded();
        let completion = run_task(&service, Task::LoadInbox { limit: 3 }).await;
        let Completion::InboxLoaded(Ok(messages)) = completion else {
            panic!("unexpected completion");
        };
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn send_task_reports_transport_failure() {
        let service = DemoMailService::seeded();
        service.fail_next("connection reset");
        let task = Task::Send(Submission {
            to: "a@x.com".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        });
        assert_eq!(
            run_task(&service, task).await,
            Completion::SendFinished(Err(MailError::transport("connection reset")))
        );
    }

    #[tokio::test]
    async fn spawned_tasks_post_completions() {
        let service: Arc<dyn MailService> = Arc::new(DemoMailService::seeded());
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        spawn_tasks(
            &tokio::runtime::Handle::current(),
            &service,
            &tx,
            vec![Task::LoadInbox { limit: 1 }],
        );
        let completion = rx.recv().await;
        assert!(matches!(
            completion,
            Some(Completion::InboxLoaded(Ok(ref messages))) if messages.len() == 1
        ));
    }
}
