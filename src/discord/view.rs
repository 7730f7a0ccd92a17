use serenity::all::{Mention, UserId};

use crate::store::{ChallengeRefused, Question};

/// Longest question list rendered inline; anything bigger points the admin
/// at the file instead. The platform's message limit counts characters.
const LIST_DISPLAY_LIMIT: usize = 1900;

pub(crate) const ADMIN_ONLY: &str = "هذا الأمر للأدمن فقط.";
pub(crate) const GUILD_ONLY: &str = "هذا الأمر يعمل داخل السيرفر فقط.";
pub(crate) const TEXT_CHANNEL_ONLY: &str = "هذا الأمر يعمل في قنوات النص داخل السيرفر فقط.";
pub(crate) const INVALID_ARGUMENTS: &str = "⚠️ الصيغة غير صحيحة. راجع `/help` لطريقة الاستخدام.";

pub(crate) const NO_QUESTIONS_YET: &str = "⚠️ لا توجد أسئلة حالياً.";
pub(crate) const NO_QUESTIONS_TO_DELETE: &str = "⚠️ لا توجد أسئلة لحذفها.";
pub(crate) const BAD_QUESTION_INDEX: &str = "⚠️ رقم السؤال غير صحيح.";
pub(crate) const BAD_ADD_ARGUMENTS: &str = "تأكد إنك كتبت السؤال والإجابات بشكل صحيح.";

pub(crate) const SCORES_RESET_ALL: &str = "✅ تم تصفير نقاط جميع المشاركين.";
pub(crate) const NO_RECORDED_POINTS: &str = "⚠️ هذا المستخدم ما عنده نقاط مسجلة.";

pub(crate) fn challenge_refused(refusal: ChallengeRefused) -> &'static str {
    match refusal {
        ChallengeRefused::AlreadyRunning => {
            "❄️ فيه سؤال شغال حالياً في هذه القناة، جاوب عليه أولاً قبل ما نبدأ سؤال جديد."
        }
        ChallengeRefused::NoQuestions => {
            "⚠️ لا توجد أسئلة حالياً. راجع ملف questions.json أو استخدم أوامر الإدارة."
        }
    }
}

pub(crate) fn challenge_opening(user_id: UserId, question_text: &str) -> String {
    format!(
        "❄️ **تحدي الشتاء بدأ!**\nيا {} جاوب على السؤال التالي خلال **{} ثانية**:\n\n🧠 **السؤال:** {}",
        Mention::from(user_id),
        crate::ANSWER_TIMEOUT.as_secs(),
        question_text
    )
}

pub(crate) fn answer_timeout(user_id: UserId) -> String {
    format!(
        "⌛ انتهى الوقت يا {}! تأخرت في الإجابة.\nتقدر تكتب `ابدا تحدي الشتاء` أو تستخدم `/winter_start` عشان تحاول مرة ثانية.",
        Mention::from(user_id)
    )
}

pub(crate) fn answer_correct(user_id: UserId, total: u32) -> String {
    format!(
        "✅ إجابة **صحيحة** يا {}! 🎉\nرصيدك الآن: **{}** نقطة.",
        Mention::from(user_id),
        total
    )
}

/// The failure notice surfaces the question's first accepted answer as an
/// example; a hand-edited question without answers shows a dash.
pub(crate) fn answer_incorrect(user_id: UserId, question: &Question) -> String {
    let example = question.answers.first().map(String::as_str).unwrap_or("—");
    format!(
        "❌ إجابة **غير صحيحة** يا {}.\nمثال لإجابة صحيحة: **{}**",
        Mention::from(user_id),
        example
    )
}

/// Entries arrive already sorted; names are resolved by the caller.
pub(crate) fn leaderboard(entries: &[(String, u32)]) -> String {
    if entries.is_empty() {
        return "🚫 لا يوجد أي مشاركات حتى الآن.".to_string();
    }

    let lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, points))| format!("**{}. {}** — {} نقطة", i + 1, name, points))
        .collect();

    format!("🏆 **ترتيب المشاركين في تحدي الشتاء:**\n\n{}", lines.join("\n"))
}

pub(crate) fn unresolved_user_label(user_id: u64) -> String {
    format!("مستخدم ({user_id})")
}

/// Numbered question list, or a pointer to the file when the body would not
/// fit in a single message.
pub(crate) fn question_list(questions: &[Question]) -> String {
    let body = questions
        .iter()
        .enumerate()
        .map(|(i, question)| format!("{}. {}", i + 1, question.text))
        .collect::<Vec<_>>()
        .join("\n");

    if body.chars().count() > LIST_DISPLAY_LIMIT {
        return "عدد الأسئلة كبير، الأفضل تعدّلها مباشرة من ملف `questions.json`.".to_string();
    }

    format!("📋 **قائمة الأسئلة:**\n{}", body)
}

pub(crate) fn question_added(question: &Question) -> String {
    format!(
        "✅ تم إضافة السؤال:\n**{}**\nعدد الإجابات المحتملة: **{}**",
        question.text,
        question.answers.len()
    )
}

pub(crate) fn question_deleted(question: &Question) -> String {
    format!("🗑 تم حذف السؤال:\n**{}**", question.text)
}

pub(crate) fn questions_reloaded(count: usize) -> String {
    format!("✅ تم إعادة تحميل الأسئلة. العدد الحالي: **{}** سؤال.", count)
}

pub(crate) fn scores_reset_user(user_id: UserId) -> String {
    format!("✅ تم تصفير نقاط {}.", Mention::from(user_id))
}

pub(crate) fn usage() -> String {
    [
        "❄️ **أوامر تحدي الشتاء:**",
        "",
        "`ابدا تحدي الشتاء` أو `/winter_start` — ابدأ سؤال عشوائي",
        "`ترتيب؟` أو `/winter_rank` — عرض ترتيب المشاركين",
        "",
        "**أوامر الأدمن:**",
        "`/winter_add_question` — إضافة سؤال جديد (الإجابات مفصولة بـ ;)",
        "`/winter_list_questions` — عرض قائمة الأسئلة",
        "`/winter_delete_question` — حذف سؤال برقمه",
        "`/winter_reload_questions` — إعادة تحميل الأسئلة من الملف",
        "`/winter_reset_scores` — تصفير النقاط (الكل أو شخص واحد)",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, answers: &[&str]) -> Question {
        Question {
            text: text.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn opening_carries_mention_question_and_window() {
        let text = challenge_opening(UserId::new(5), "ما هي عاصمة قطر؟");
        assert!(text.contains("<@5>"));
        assert!(text.contains("ما هي عاصمة قطر؟"));
        assert!(text.contains("**30 ثانية**"));
    }

    #[test]
    fn timeout_notice_tells_the_user_how_to_retry() {
        let text = answer_timeout(UserId::new(5));
        assert!(text.contains("<@5>"));
        assert!(text.contains("ابدا تحدي الشتاء"));
        assert!(text.contains("/winter_start"));
    }

    #[test]
    fn correct_notice_shows_the_new_total() {
        let text = answer_correct(UserId::new(5), 3);
        assert!(text.contains("**3** نقطة"));
    }

    #[test]
    fn incorrect_notice_surfaces_the_first_accepted_answer() {
        let text =
            answer_incorrect(UserId::new(5), &question("Capital of Qatar?", &["Doha", "doha"]));
        assert!(text.contains("**Doha**"));
    }

    #[test]
    fn incorrect_notice_falls_back_without_answers() {
        let text = answer_incorrect(UserId::new(5), &question("؟", &[]));
        assert!(text.contains("**—**"));
    }

    #[test]
    fn leaderboard_ranks_in_given_order() {
        let text = leaderboard(&[("أحمد".to_string(), 5), ("سارة".to_string(), 3)]);
        assert!(text.starts_with("🏆"));
        assert!(text.contains("**1. أحمد** — 5 نقطة"));
        assert!(text.contains("**2. سارة** — 3 نقطة"));
    }

    #[test]
    fn empty_leaderboard_has_its_own_notice() {
        assert_eq!(leaderboard(&[]), "🚫 لا يوجد أي مشاركات حتى الآن.");
    }

    #[test]
    fn question_list_is_one_indexed() {
        let list = question_list(&[question("أول سؤال", &["أ"]), question("ثاني سؤال", &["ب"])]);
        assert!(list.contains("1. أول سؤال"));
        assert!(list.contains("2. ثاني سؤال"));
    }

    #[test]
    fn oversized_question_list_points_at_the_file() {
        let long = vec![question(&"س".repeat(2000), &["أ"])];
        let list = question_list(&long);
        assert!(list.contains("questions.json"));
        assert!(!list.contains("📋"));
    }

    #[test]
    fn unresolved_user_label_shows_the_raw_id() {
        assert_eq!(unresolved_user_label(42), "مستخدم (42)");
    }
}
