use crate::types::Voice;

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
/// ```
///
/// Rows that do not start with a numeric priority or have fewer than five
/// columns are skipped. The first voice listed is marked as the default.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    let mut voices: Vec<Voice> = output.lines().filter_map(parse_voice_row).collect();
    if let Some(first) = voices.first_mut() {
        first.default = true;
    }
    voices
}

fn parse_voice_row(line: &str) -> Option<Voice> {
    let cols: Vec<&str> = line.split_whitespace().collect();
    if cols.len() < 5 || cols[0].parse::<u32>().is_err() {
        return None;
    }
    let lang = cols[1];
    let name = cols[3].replace('_', " ");
    Some(Voice::new(name, lang))
}
