use crate::voice::Voice;

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
/// ```
///
/// espeak voices are all local. Underscores in names stand for spaces.
/// Malformed rows are skipped.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    let mut voices = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first().is_some_and(|f| f.eq_ignore_ascii_case("pty")) {
            continue;
        }
        let [priority, lang, _age_gender, name, file, ..] = fields.as_slice() else {
            if !line.trim().is_empty() {
                log::debug!("Skipping espeak voice row: {line:?}");
            }
            continue;
        };
        if priority.parse::<u32>().is_err() {
            log::debug!("Skipping espeak voice row with bad priority: {line:?}");
            continue;
        }

        voices.push(Voice {
            lang: (*lang).to_string(),
            name: name.replace('_', " "),
            local_service: true,
            voice_uri: Some((*file).to_string()),
        });
    }

    voices
}
