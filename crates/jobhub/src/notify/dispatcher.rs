use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::{Notification, NotificationTransport, Notifier, NotifyError};

/// Queues notifications and delivers them from a dedicated worker thread.
pub struct NotificationDispatcher {
    sender: Mutex<Option<Sender<Notification>>>,
    worker: Mutex<Option<JoinHandle<usize>>>,
}

impl NotificationDispatcher {
    pub fn spawn<T: NotificationTransport>(mut transport: T) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Notification>();

        let worker = thread::Builder::new()
            .name("jobhub-notify".to_string())
            .spawn(move || {
                let mut delivered = 0usize;
                for notification in receiver {
                    match transport.deliver(&notification) {
                        Ok(()) => {
                            delivered += 1;
                            debug!(template = %notification.template, "notification handed to transport");
                        }
                        Err(err) => error!(
                            %err,
                            channel = notification.channel.label(),
                            template = %notification.template,
                            "notification delivery failed"
                        ),
                    }
                }
                delivered
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Close the queue, drain what is already queued and join the worker.
    /// Returns how many notifications the transport accepted.
    pub fn shutdown(&self) -> usize {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match worker.map(JoinHandle::join) {
            Some(Ok(delivered)) => delivered,
            Some(Err(_)) => {
                error!("notification worker panicked");
                0
            }
            None => 0,
        }
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(notification).map_err(|_| NotifyError::Closed),
            None => Err(NotifyError::Closed),
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Channel, RecordingNotifier};

    struct FailingTransport;

    impl NotificationTransport for FailingTransport {
        fn deliver(&mut self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp relay refused".to_string()))
        }
    }

    #[test]
    fn delivers_queued_notifications_before_shutdown_returns() {
        let outbox = RecordingNotifier::default();
        let dispatcher = NotificationDispatcher::spawn(outbox.clone()).expect("worker starts");

        for index in 0..5 {
            dispatcher
                .notify(Notification::new(
                    Channel::Sms,
                    "+15550001111",
                    "otp_verification",
                    format!("code {index}"),
                ))
                .expect("queued");
        }

        assert_eq!(dispatcher.shutdown(), 5);
        assert_eq!(outbox.deliveries().len(), 5);
        assert_eq!(outbox.deliveries()[4].body, "code 4");
    }

    #[test]
    fn notify_after_shutdown_is_rejected() {
        let dispatcher =
            NotificationDispatcher::spawn(RecordingNotifier::default()).expect("worker starts");
        dispatcher.shutdown();

        let result = dispatcher.notify(Notification::email("a@example.com", "welcome", "hi"));
        assert!(matches!(result, Err(NotifyError::Closed)));
        assert_eq!(dispatcher.shutdown(), 0);
    }

    #[test]
    fn transport_failures_do_not_stop_the_worker() {
        let dispatcher = NotificationDispatcher::spawn(FailingTransport).expect("worker starts");
        dispatcher
            .notify(Notification::email("a@example.com", "welcome", "hi"))
            .expect("queued");
        dispatcher
            .notify(Notification::email("b@example.com", "welcome", "hi"))
            .expect("queued");
        assert_eq!(dispatcher.shutdown(), 0);
    }
}
