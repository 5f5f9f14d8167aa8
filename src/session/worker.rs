//! Worker thread hosting one agent.
//!
//! The harness talks to the worker over a request/reply channel pair and
//! waits at most the call's remaining budget for each reply. A worker that
//! misses a deadline is abandoned: its cancel token is raised and the
//! harness never talks to it again, so a late reply cannot be mistaken for
//! the answer to a later call. The thread itself is detached and exits on
//! its own once its current call returns.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::debug;

use crate::agents::{Agent, AgentFactory, AgentFault};
use crate::core::{Action, PlayerId};
use crate::game::Observation;
use crate::timing::{CancelToken, Timer};

enum Request {
    Construct { obs: Observation, timer: Timer },
    Act { obs: Observation, timer: Timer },
    Result { obs: Observation, timer: Timer },
}

enum Reply {
    Constructed,
    Action(Action),
    Done,
    Fault(AgentFault),
}

/// How a timed call ended, from the caller's side.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CallOutcome<T> {
    Replied(T),
    Faulted(AgentFault),
    /// No reply before the deadline, or a reply that arrived after it.
    TimedOut,
    /// The worker thread is gone.
    Crashed,
}

pub(crate) struct AgentWorker {
    player: PlayerId,
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    cancel: CancelToken,
}

impl AgentWorker {
    pub(crate) fn spawn(player: PlayerId, factory: Box<dyn AgentFactory>) -> std::io::Result<Self> {
        let (requests, inbox) = bounded(1);
        let (outbox, replies) = bounded(1);
        let cancel = CancelToken::new();
        let token = cancel.clone();

        thread::Builder::new()
            .name(format!("agent-{}", player.0))
            .spawn(move || serve(factory, token, inbox, outbox))?;

        Ok(Self {
            player,
            requests,
            replies,
            cancel,
        })
    }

    pub(crate) fn construct(&self, obs: Observation, timer: &Timer) -> CallOutcome<()> {
        let request = Request::Construct {
            obs,
            timer: timer.clone(),
        };
        self.call(request, timer, |reply| match reply {
            Reply::Constructed => Some(()),
            _ => None,
        })
    }

    pub(crate) fn act(&self, obs: Observation, timer: &Timer) -> CallOutcome<Action> {
        let request = Request::Act {
            obs,
            timer: timer.clone(),
        };
        self.call(request, timer, |reply| match reply {
            Reply::Action(action) => Some(action),
            _ => None,
        })
    }

    pub(crate) fn result(&self, obs: Observation, timer: &Timer) -> CallOutcome<()> {
        let request = Request::Result {
            obs,
            timer: timer.clone(),
        };
        self.call(request, timer, |reply| match reply {
            Reply::Done => Some(()),
            _ => None,
        })
    }

    /// Stop waiting on this worker for good.
    pub(crate) fn abandon(self) {
        debug!(player = %self.player, "abandoning agent worker");
        drop(self);
    }

    fn call<T>(
        &self,
        request: Request,
        timer: &Timer,
        expect: impl FnOnce(Reply) -> Option<T>,
    ) -> CallOutcome<T> {
        if self.requests.send(request).is_err() {
            return CallOutcome::Crashed;
        }
        match self.replies.recv_timeout(timer.time_left()) {
            Ok(_) if timer.exceeded() => CallOutcome::TimedOut,
            Ok(Reply::Fault(fault)) => CallOutcome::Faulted(fault),
            Ok(reply) => match expect(reply) {
                Some(value) => CallOutcome::Replied(value),
                None => CallOutcome::Faulted(AgentFault::new("worker answered out of turn")),
            },
            Err(RecvTimeoutError::Timeout) => CallOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => CallOutcome::Crashed,
        }
    }
}

impl Drop for AgentWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn serve(
    factory: Box<dyn AgentFactory>,
    cancel: CancelToken,
    inbox: Receiver<Request>,
    outbox: Sender<Reply>,
) {
    let mut agent: Option<Box<dyn Agent>> = None;

    for request in inbox.iter() {
        let reply = match request {
            Request::Construct { obs, timer } => {
                match guarded(|| factory.construct(&obs, &timer, &cancel)) {
                    Ok(built) => {
                        agent = Some(built);
                        Reply::Constructed
                    }
                    Err(fault) => Reply::Fault(fault),
                }
            }
            Request::Act { obs, timer } => match agent.as_mut() {
                Some(agent) => match guarded(|| agent.act(&obs, &timer)) {
                    Ok(action) => Reply::Action(action),
                    Err(fault) => Reply::Fault(fault),
                },
                None => Reply::Fault(AgentFault::new("agent was never constructed")),
            },
            Request::Result { obs, timer } => match agent.as_mut() {
                Some(agent) => match guarded(|| agent.result(&obs, &timer)) {
                    Ok(()) => Reply::Done,
                    Err(fault) => Reply::Fault(fault),
                },
                None => Reply::Fault(AgentFault::new("agent was never constructed")),
            },
        };
        if outbox.send(reply).is_err() {
            break;
        }
    }
}

/// Run agent code, turning a panic into a fault.
fn guarded<T>(call: impl FnOnce() -> Result<T, AgentFault>) -> Result<T, AgentFault> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(AgentFault::new(format!("panicked: {}", panic_message(&*payload)))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{fn_agent, IndexAgent};
    use crate::timing::TimeBudget;
    use std::time::Duration;

    fn obs() -> Observation {
        Observation::new(PlayerId(0), 1, 0).with_actions(vec![Action::Up, Action::Down])
    }

    fn timer(ms: u64) -> Timer {
        TimeBudget::from_millis(ms).start()
    }

    #[test]
    fn test_construct_then_act() {
        let worker = AgentWorker::spawn(PlayerId(0), Box::new(IndexAgent::new(1))).unwrap();
        assert_eq!(worker.construct(obs(), &timer(1000)), CallOutcome::Replied(()));
        assert_eq!(worker.act(obs(), &timer(1000)), CallOutcome::Replied(Action::Down));
        assert_eq!(worker.result(obs(), &timer(1000)), CallOutcome::Replied(()));
    }

    #[test]
    fn test_act_before_construct_faults() {
        let worker = AgentWorker::spawn(PlayerId(0), Box::new(IndexAgent::new(0))).unwrap();
        assert!(matches!(worker.act(obs(), &timer(1000)), CallOutcome::Faulted(_)));
    }

    #[test]
    fn test_slow_call_times_out() {
        let slow = fn_agent("slow", |_: &Observation, _: &Timer| {
            thread::sleep(Duration::from_millis(50));
            Ok(Action::Nil)
        });
        let worker = AgentWorker::spawn(PlayerId(0), Box::new(slow)).unwrap();
        assert_eq!(worker.construct(obs(), &timer(1000)), CallOutcome::Replied(()));
        assert_eq!(worker.act(obs(), &timer(10)), CallOutcome::TimedOut);
        worker.abandon();
    }

    #[test]
    fn test_panic_becomes_fault() {
        let panicky = fn_agent("panicky", |_: &Observation, _: &Timer| -> Result<Action, AgentFault> {
            panic!("bad agent")
        });
        let worker = AgentWorker::spawn(PlayerId(0), Box::new(panicky)).unwrap();
        assert_eq!(worker.construct(obs(), &timer(1000)), CallOutcome::Replied(()));
        match worker.act(obs(), &timer(1000)) {
            CallOutcome::Faulted(fault) => assert_eq!(fault.0, "panicked: bad agent"),
            _ => panic!("expected a fault"),
        }
        // the worker survives the panic
        assert_eq!(worker.result(obs(), &timer(1000)), CallOutcome::Replied(()));
    }
}
