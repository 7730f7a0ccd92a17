use serenity::all::{ChannelId, Context, GuildId, UserId};
use tracing::error;

use crate::discord::view;
use crate::store::TriviaStore;

/// Sends a plain message from a path where the caller has nowhere to report
/// the failure, so it is logged instead.
pub(crate) async fn say_logged(ctx: &Context, channel_id: ChannelId, text: impl Into<String>) {
    if let Err(e) = channel_id.say(&ctx.http, text).await {
        error!("Error sending message to channel {channel_id}: {e:?}");
    }
}

/// Renders the leaderboard for a guild, resolving display names through the
/// member cache with a raw-id label for anyone no longer resolvable.
pub(crate) fn leaderboard_message(ctx: &Context, guild_id: GuildId, store: &TriviaStore) -> String {
    let entries: Vec<(String, u32)> = store
        .leaderboard()
        .into_iter()
        .map(|(user_id, points)| {
            let name = member_display_name(ctx, guild_id, UserId::new(user_id))
                .unwrap_or_else(|| view::unresolved_user_label(user_id));
            (name, points)
        })
        .collect();

    view::leaderboard(&entries)
}

fn member_display_name(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<String> {
    guild_id.to_guild_cached(&ctx.cache).and_then(|guild| {
        guild
            .members
            .get(&user_id)
            .map(|member| member.display_name().to_string())
    })
}
