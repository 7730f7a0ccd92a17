use poise::CreateReply;
use serenity::all::User;
use tracing::{error, info};

use crate::discord::challenge::{self, ReplyRouter};
use crate::discord::{utils, view};
use crate::store::{Question, TriviaStore};

/// Shared handle given to every command invocation.
pub(crate) struct Data {
    pub(crate) store: TriviaStore,
    pub(crate) router: ReplyRouter,
}

pub(crate) type Error = Box<dyn std::error::Error + Send + Sync>;
pub(crate) type Context<'a> = poise::Context<'a, Data, Error>;

/// Every command the bot registers, in display order.
pub(crate) fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        winter_start(),
        winter_rank(),
        help(),
        winter_add_question(),
        winter_list_questions(),
        winter_delete_question(),
        winter_reload_questions(),
        winter_reset_scores(),
    ]
}

/// ابدأ سؤال عشوائي من تحدي الشتاء
#[poise::command(slash_command, prefix_command, guild_only)]
pub(crate) async fn winter_start(ctx: Context<'_>) -> Result<(), Error> {
    let channel_id = ctx.channel_id();
    let user_id = ctx.author().id;

    match challenge::open_challenge(&ctx.data().store, &ctx.data().router, channel_id, user_id) {
        Err(refusal) => {
            ctx.say(view::challenge_refused(refusal)).await?;
        }
        Ok(open) => {
            ctx.say(view::challenge_opening(user_id, &open.question.text)).await?;
            challenge::await_and_grade(
                ctx.serenity_context(),
                &ctx.data().store,
                open,
                channel_id,
                user_id,
            )
            .await?;
        }
    }
    Ok(())
}

/// عرض ترتيب المشاركين في تحدي الشتاء
#[poise::command(slash_command, prefix_command, guild_only)]
pub(crate) async fn winter_rank(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let message = utils::leaderboard_message(ctx.serenity_context(), guild_id, &ctx.data().store);
    ctx.say(message).await?;
    Ok(())
}

/// عرض أوامر تحدي الشتاء
#[poise::command(slash_command, prefix_command)]
pub(crate) async fn help(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(view::usage()).await?;
    Ok(())
}

/// إضافة سؤال جديد لتحدي الشتاء (أدمن فقط)
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    aliases("اضف_سؤال")
)]
pub(crate) async fn winter_add_question(
    ctx: Context<'_>,
    #[description = "نص السؤال"] question: String,
    #[description = "كل الإجابات الصحيحة مفصولة بـ ; مثال: الرياض;رياض"]
    #[rest]
    answers: String,
) -> Result<(), Error> {
    let text = question.trim().to_string();
    let answer_list = parse_answer_list(&answers);

    if text.is_empty() || answer_list.is_empty() {
        ctx.say(view::BAD_ADD_ARGUMENTS).await?;
        return Ok(());
    }

    let added = Question { text, answers: answer_list };
    let confirmation = view::question_added(&added);
    info!("adding question {:?} with {} answers", added.text, added.answers.len());
    ctx.data().store.add_question(added);
    ctx.say(confirmation).await?;
    Ok(())
}

/// عرض قائمة الأسئلة (أدمن فقط)
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    aliases("الأسئلة")
)]
pub(crate) async fn winter_list_questions(ctx: Context<'_>) -> Result<(), Error> {
    let questions = ctx.data().store.questions_snapshot();
    if questions.is_empty() {
        ctx.say(view::NO_QUESTIONS_YET).await?;
    } else {
        ctx.say(view::question_list(&questions)).await?;
    }
    Ok(())
}

/// حذف سؤال برقم من القائمة (أدمن فقط)
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    aliases("حذف_سؤال")
)]
pub(crate) async fn winter_delete_question(
    ctx: Context<'_>,
    #[description = "رقم السؤال كما يظهر في قائمة الأسئلة (1، 2، 3، ...)"] index: i64,
) -> Result<(), Error> {
    let store = &ctx.data().store;
    if store.question_count() == 0 {
        ctx.say(view::NO_QUESTIONS_TO_DELETE).await?;
        return Ok(());
    }

    let removed = usize::try_from(index).ok().and_then(|index| store.remove_question(index));
    let reply = match removed {
        Some(question) => {
            info!("deleted question {:?}", question.text);
            view::question_deleted(&question)
        }
        None => view::BAD_QUESTION_INDEX.to_string(),
    };
    ctx.say(reply).await?;
    Ok(())
}

/// إعادة تحميل questions.json من جديد (أدمن فقط)
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    aliases("إعادة_تحميل_الأسئلة")
)]
pub(crate) async fn winter_reload_questions(ctx: Context<'_>) -> Result<(), Error> {
    let count = ctx.data().store.reload_questions();
    ctx.say(view::questions_reloaded(count)).await?;
    Ok(())
}

/// تصفير النقاط (الكل أو شخص واحد) (أدمن فقط)
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    aliases("تصفير_النقاط")
)]
pub(crate) async fn winter_reset_scores(
    ctx: Context<'_>,
    #[description = "اختياري: مستخدم معيّن لتصفير نقاطه فقط. لو تركته فاضي يصفر نقاط الجميع."]
    user: Option<User>,
) -> Result<(), Error> {
    let store = &ctx.data().store;
    let reply = match user {
        None => {
            info!("resetting all scores");
            store.reset_all_scores();
            view::SCORES_RESET_ALL.to_string()
        }
        Some(user) => {
            if store.reset_user_score(user.id.get()) {
                info!("reset score of user {}", user.id);
                view::scores_reset_user(user.id)
            } else {
                view::NO_RECORDED_POINTS.to_string()
            }
        }
    };
    ctx.say(reply).await?;
    Ok(())
}

/// The framework error hook: renders the rejection notices for permission,
/// scope and argument problems, logs the rest.
pub(crate) async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("failed to set up the command framework: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("command {} failed: {error:?}", ctx.command().qualified_name);
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            send_notice(ctx, view::ADMIN_ONLY).await;
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            let notice = if ctx.command().name == "winter_start" {
                view::TEXT_CHANNEL_ONLY
            } else {
                view::GUILD_ONLY
            };
            send_notice(ctx, notice).await;
        }
        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
            info!(
                "rejected arguments {input:?} for {}: {error}",
                ctx.command().qualified_name
            );
            send_notice(ctx, view::INVALID_ARGUMENTS).await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling framework error: {e:?}");
            }
        }
    }
}

async fn send_notice(ctx: Context<'_>, notice: &str) {
    if let Err(e) = ctx.send(CreateReply::default().content(notice).ephemeral(true)).await {
        error!("Error sending rejection notice: {e:?}");
    }
}

/// Splits a `;`-separated answer list, trimming entries and dropping empty
/// ones.
fn parse_answer_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|answer| !answer.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::Permissions;

    const ADMIN_COMMANDS: [&str; 5] = [
        "winter_add_question",
        "winter_list_questions",
        "winter_delete_question",
        "winter_reload_questions",
        "winter_reset_scores",
    ];

    #[test]
    fn admin_commands_declare_the_administrator_gate() {
        for command in all_commands() {
            let is_admin = ADMIN_COMMANDS.contains(&command.name.as_str());
            assert_eq!(
                command.required_permissions.contains(Permissions::ADMINISTRATOR),
                is_admin,
                "{}",
                command.name
            );
            if is_admin {
                assert!(command.guild_only, "{}", command.name);
            }
        }
    }

    #[test]
    fn admin_commands_keep_their_arabic_prefix_names() {
        let table = all_commands();
        let aliases_of = |name: &str| -> Vec<String> {
            table
                .iter()
                .find(|command| command.name == name)
                .map(|command| command.aliases.clone())
                .unwrap_or_default()
        };

        assert_eq!(aliases_of("winter_add_question"), vec!["اضف_سؤال"]);
        assert_eq!(aliases_of("winter_delete_question"), vec!["حذف_سؤال"]);
        assert_eq!(aliases_of("winter_reset_scores"), vec!["تصفير_النقاط"]);
    }

    #[test]
    fn answer_list_is_trimmed_and_filtered() {
        assert_eq!(parse_answer_list("الرياض; رياض ;"), vec!["الرياض", "رياض"]);
        assert_eq!(parse_answer_list("Doha"), vec!["Doha"]);
    }

    #[test]
    fn answer_list_of_only_separators_is_empty() {
        assert!(parse_answer_list(";;;").is_empty());
        assert!(parse_answer_list("   ").is_empty());
    }
}
