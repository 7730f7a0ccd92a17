use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serenity::all::{ChannelId, Context, Message, UserId};
use tokio::sync::oneshot;
use tracing::debug;

use crate::discord::view;
use crate::matcher::is_answer_correct;
use crate::store::{ChallengeRefused, Question, TriviaStore};

type WaiterMap = HashMap<(u64, u64), oneshot::Sender<Message>>;

/// Pending reply subscriptions, keyed by (channel id, user id). The gateway
/// message handler takes the waiter matching an incoming message, if any,
/// and feeds it that message; everything else is left alone.
#[derive(Clone, Default)]
pub(crate) struct ReplyRouter {
    waiters: Arc<Mutex<WaiterMap>>,
}

impl ReplyRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for the next message by `user_id` in `channel_id`.
    fn subscribe(&self, channel_id: u64, user_id: u64) -> oneshot::Receiver<Message> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert((channel_id, user_id), tx);
        rx
    }

    /// Removes and returns the waiter for this (channel, user) pair, so the
    /// first qualifying message resolves the wait and later ones do not.
    pub(crate) fn take_waiter(
        &self,
        channel_id: u64,
        user_id: u64,
    ) -> Option<oneshot::Sender<Message>> {
        self.lock().remove(&(channel_id, user_id))
    }

    fn cancel(&self, channel_id: u64, user_id: u64) {
        self.lock().remove(&(channel_id, user_id));
    }

    fn lock(&self) -> MutexGuard<'_, WaiterMap> {
        self.waiters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Keeps a round's channel marked active while it lives. Dropping it returns
/// the channel to idle and removes the reply subscription, whichever way the
/// round ended: answer, timeout, failed send or a panic while grading.
pub(crate) struct ChallengeGuard {
    store: TriviaStore,
    router: ReplyRouter,
    channel_id: u64,
    user_id: u64,
}

impl Drop for ChallengeGuard {
    fn drop(&mut self) {
        self.router.cancel(self.channel_id, self.user_id);
        self.store.end_challenge(self.channel_id);
        debug!(channel_id = self.channel_id, "challenge round closed");
    }
}

/// One activated round: the drawn question, the pending reply and the
/// cleanup guard, handed to the caller for publication and grading.
pub(crate) struct OpenChallenge {
    pub(crate) question: Question,
    reply: oneshot::Receiver<Message>,
    guard: ChallengeGuard,
}

/// Tries to activate a round in the channel. The active flag and the random
/// question draw happen under one lock; the reply subscription is registered
/// here, before the caller publishes the question, so no reply can slip in
/// between publication and listening. A refusal changes nothing, including
/// any round already running in the channel.
pub(crate) fn open_challenge(
    store: &TriviaStore,
    router: &ReplyRouter,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<OpenChallenge, ChallengeRefused> {
    let question = store.begin_challenge(channel_id.get())?;
    let reply = router.subscribe(channel_id.get(), user_id.get());
    let guard = ChallengeGuard {
        store: store.clone(),
        router: router.clone(),
        channel_id: channel_id.get(),
        user_id: user_id.get(),
    };
    Ok(OpenChallenge { question, reply, guard })
}

/// Waits for the user's reply within `ANSWER_TIMEOUT`, grades it and
/// announces the outcome in the channel. The caller has already published
/// the question text.
pub(crate) async fn await_and_grade(
    ctx: &Context,
    store: &TriviaStore,
    open: OpenChallenge,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<(), serenity::Error> {
    let OpenChallenge { question, reply, guard: _guard } = open;

    match tokio::time::timeout(crate::ANSWER_TIMEOUT, reply).await {
        Ok(Ok(message)) => {
            if is_answer_correct(&message.content, &question.answers, crate::MATCH_THRESHOLD) {
                let total = store.award_point(user_id.get());
                debug!(user_id = user_id.get(), total, "correct answer");
                channel_id.say(&ctx.http, view::answer_correct(user_id, total)).await?;
            } else {
                debug!(user_id = user_id.get(), "incorrect answer");
                channel_id.say(&ctx.http, view::answer_incorrect(user_id, &question)).await?;
            }
        }
        // A dropped sender can only mean the subscription went away, which
        // ends the round the same way as the deadline.
        Ok(Err(_)) | Err(_) => {
            debug!(user_id = user_id.get(), "challenge timed out");
            channel_id.say(&ctx.http, view::answer_timeout(user_id)).await?;
        }
    }

    Ok(())
}
