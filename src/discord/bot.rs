use anyhow::Context as _;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;
use tracing::{error, info};

use crate::config::BotConfig;
use crate::discord::challenge::{self, ReplyRouter};
use crate::discord::commands::{self, Data};
use crate::discord::{utils, view};
use crate::store::TriviaStore;

const COMMAND_PREFIX: &str = "!";

const START_TRIGGER: &str = "ابدا تحدي الشتاء";
const LEADERBOARD_TRIGGER: &str = "ترتيب؟";

struct Handler {
    store: TriviaStore,
    router: ReplyRouter,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // A round waiting on this (channel, user) gets the message first;
        // grading happens in the round that registered the waiter. Messages
        // with no waiter are left for the trigger checks below.
        if let Some(waiter) = self.router.take_waiter(msg.channel_id.get(), msg.author.id.get()) {
            let _ = waiter.send(msg.clone());
        }

        let content = msg.content.trim();
        if content == START_TRIGGER {
            if msg.guild_id.is_some() {
                self.start_from_trigger(&ctx, &msg).await;
            }
        } else if content == LEADERBOARD_TRIGGER {
            match msg.guild_id {
                Some(guild_id) => {
                    let board = utils::leaderboard_message(&ctx, guild_id, &self.store);
                    utils::say_logged(&ctx, msg.channel_id, board).await;
                }
                None => utils::say_logged(&ctx, msg.channel_id, view::GUILD_ONLY).await,
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("logged in as {} (id {})", ready.user.tag(), ready.user.id);
        info!("ready for the winter challenge");
    }
}

impl Handler {
    async fn start_from_trigger(&self, ctx: &Context, msg: &Message) {
        let channel_id = msg.channel_id;
        let user_id = msg.author.id;

        match challenge::open_challenge(&self.store, &self.router, channel_id, user_id) {
            Err(refusal) => {
                utils::say_logged(ctx, channel_id, view::challenge_refused(refusal)).await;
            }
            Ok(open) => {
                utils::say_logged(ctx, channel_id, view::challenge_opening(user_id, &open.question.text)).await;
                if let Err(e) =
                    challenge::await_and_grade(ctx, &self.store, open, channel_id, user_id).await
                {
                    error!("challenge round in channel {channel_id} failed: {e:?}");
                }
            }
        }
    }
}

pub(crate) struct TriviaBot {
    client: Client,
}

impl TriviaBot {
    pub(crate) async fn new(store: TriviaStore, config: &BotConfig) -> anyhow::Result<Self> {
        // Member intent for leaderboard display names, message content for
        // the phrase triggers and challenge replies.
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::MESSAGE_CONTENT;

        let router = ReplyRouter::new();
        let handler = Handler { store: store.clone(), router: router.clone() };

        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands: commands::all_commands(),
                prefix_options: poise::PrefixFrameworkOptions {
                    prefix: Some(COMMAND_PREFIX.to_string()),
                    ..Default::default()
                },
                on_error: |error| Box::pin(commands::on_error(error)),
                ..Default::default()
            })
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!(
                        "synced {} slash commands as {}",
                        framework.options().commands.len(),
                        ready.user.name
                    );
                    Ok(Data { store, router })
                })
            })
            .build();

        let client = Client::builder(&config.token, intents)
            .event_handler(handler)
            .framework(framework)
            .await
            .context("Error creating the Discord client")?;

        Ok(TriviaBot { client })
    }

    pub(crate) async fn run(&mut self) -> anyhow::Result<()> {
        self.client.start().await.context("Discord client stopped with an error")
    }
}
