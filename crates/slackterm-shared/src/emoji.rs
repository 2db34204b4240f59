//! Static `:name:` to unicode lookup table for emoji placeholders.
//!
//! The table is kept sorted by code so lookups can binary search it.

static EMOJI_CODEMAP: &[(&str, &str)] = &[
    (":+1:", "👍"),
    (":-1:", "👎"),
    (":100:", "💯"),
    (":alarm_clock:", "⏰"),
    (":angry:", "😠"),
    (":astonished:", "😲"),
    (":balloon:", "🎈"),
    (":bangbang:", "‼️"),
    (":beer:", "🍺"),
    (":beers:", "🍻"),
    (":bell:", "🔔"),
    (":blush:", "😊"),
    (":bomb:", "💣"),
    (":boom:", "💥"),
    (":broken_heart:", "💔"),
    (":bug:", "🐛"),
    (":bulb:", "💡"),
    (":cake:", "🍰"),
    (":calendar:", "📆"),
    (":camera:", "📷"),
    (":cat:", "🐱"),
    (":check:", "✔️"),
    (":clap:", "👏"),
    (":clock1:", "🕐"),
    (":cloud:", "☁️"),
    (":coffee:", "☕"),
    (":cold_sweat:", "😰"),
    (":computer:", "💻"),
    (":confused:", "😕"),
    (":construction:", "🚧"),
    (":cool:", "🆒"),
    (":cry:", "😢"),
    (":crying_cat_face:", "😿"),
    (":disappointed:", "😞"),
    (":dizzy:", "💫"),
    (":dog:", "🐶"),
    (":eyes:", "👀"),
    (":facepalm:", "🤦"),
    (":fire:", "🔥"),
    (":fist:", "✊"),
    (":flushed:", "😳"),
    (":ghost:", "👻"),
    (":gift:", "🎁"),
    (":grin:", "😁"),
    (":grinning:", "😀"),
    (":heart:", "❤️"),
    (":heart_eyes:", "😍"),
    (":heavy_check_mark:", "✔️"),
    (":heavy_plus_sign:", "➕"),
    (":hourglass:", "⌛"),
    (":hugging_face:", "🤗"),
    (":hushed:", "😯"),
    (":innocent:", "😇"),
    (":joy:", "😂"),
    (":key:", "🔑"),
    (":kiss:", "💋"),
    (":kissing_heart:", "😘"),
    (":laughing:", "😆"),
    (":lock:", "🔒"),
    (":mag:", "🔍"),
    (":mask:", "😷"),
    (":memo:", "📝"),
    (":moneybag:", "💰"),
    (":muscle:", "💪"),
    (":neutral_face:", "😐"),
    (":no_entry:", "⛔"),
    (":no_entry_sign:", "🚫"),
    (":ok:", "🆗"),
    (":ok_hand:", "👌"),
    (":open_mouth:", "😮"),
    (":package:", "📦"),
    (":partying_face:", "🥳"),
    (":pencil:", "📝"),
    (":pensive:", "😔"),
    (":point_down:", "👇"),
    (":point_left:", "👈"),
    (":point_right:", "👉"),
    (":point_up:", "☝️"),
    (":pray:", "🙏"),
    (":question:", "❓"),
    (":rage:", "😡"),
    (":raised_hands:", "🙌"),
    (":relaxed:", "☺️"),
    (":relieved:", "😌"),
    (":robot_face:", "🤖"),
    (":rocket:", "🚀"),
    (":rolling_on_the_floor_laughing:", "🤣"),
    (":rotating_light:", "🚨"),
    (":scream:", "😱"),
    (":see_no_evil:", "🙈"),
    (":shrug:", "🤷"),
    (":simple_smile:", "🙂"),
    (":skull:", "💀"),
    (":sleeping:", "😴"),
    (":slightly_smiling_face:", "🙂"),
    (":smile:", "😄"),
    (":smiley:", "😃"),
    (":smirk:", "😏"),
    (":sob:", "😭"),
    (":sparkles:", "✨"),
    (":star:", "⭐"),
    (":stuck_out_tongue:", "😛"),
    (":stuck_out_tongue_winking_eye:", "😜"),
    (":sunglasses:", "😎"),
    (":sunny:", "☀️"),
    (":sweat:", "😓"),
    (":sweat_smile:", "😅"),
    (":tada:", "🎉"),
    (":thinking_face:", "🤔"),
    (":thumbsdown:", "👎"),
    (":thumbsup:", "👍"),
    (":tired_face:", "😫"),
    (":trophy:", "🏆"),
    (":unamused:", "😒"),
    (":upside_down_face:", "🙃"),
    (":v:", "✌️"),
    (":warning:", "⚠️"),
    (":wave:", "👋"),
    (":white_check_mark:", "✅"),
    (":wink:", "😉"),
    (":worried:", "😟"),
    (":x:", "❌"),
    (":yum:", "😋"),
    (":zap:", "⚡"),
    (":zzz:", "💤"),
];

/// Look up the unicode replacement for a `:name:` placeholder.
pub fn lookup(code: &str) -> Option<&'static str> {
    EMOJI_CODEMAP
        .binary_search_by(|(key, _)| (*key).cmp(code))
        .ok()
        .map(|index| EMOJI_CODEMAP[index].1)
}
