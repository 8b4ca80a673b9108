//! Patient-identity extraction from free-text folder names.
//!
//! Folder names in migrated clinical trees mix patient names, birthdates,
//! case numbers, treating physicians, honorifics and ward annotations in no
//! fixed order (`"Mueller, Hans geb. 12.03.1950 Dr. Schmidt 123456"`). The
//! extractor is a pipeline of pure stage functions over a token sequence:
//! normalize → birthdate → sub-split → doctor/case isolation → name assembly.
//! It is total over strings — malformed names degrade to `None` fields, they
//! never error — and deterministic, because it is consulted twice per folder
//! (once to test the patient boundary, once to name the output artifacts).

pub mod dates;

use serde::{Deserialize, Serialize};

/// Structured identity fields derived from one folder name.
/// A name that yields no case number does not denote a patient folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub case_nr: Option<String>,
}

impl Identity {
    pub fn is_patient(&self) -> bool {
        self.case_nr.is_some()
    }
}

/// Honorifics, connector words and administrative filler dropped during
/// normalization. Doctor titles are NOT in this list: they must survive into
/// the isolation stage so the following doctor name can be skipped.
const STOPWORDS: &[&str] = &[
    "geb", "fallnr", "fall-nr", "fr", "frau", "hr", "herr", "der", "auf", "zim",
];

/// Marker preceding birthdates, glued or free-standing (`geb.12.03.1950`).
const BIRTHDATE_PREFIX: &str = "geb.";

/// Ward/department annotations; any token containing one is discarded.
const DEPARTMENT_MARKERS: &[&str] = &["station", "ambulanz"];

/// A case number is a purely numeric token longer than this many digits.
const CASE_NR_MIN_DIGITS: usize = 5;

/// Doctor names this short are assumed to be abbreviations, not surnames,
/// and are not skipped.
const SHORT_SURNAME_LEN: usize = 2;

/// One element of the working token stream. The consumed birthdate leaves an
/// explicit sentinel behind so the name-assembly stage knows where it stood.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Birthday,
}

/// Extract `{first_name, last_name, birthday, case_nr}` from a folder name.
/// Pure and deterministic; any field may come back `None`.
pub fn extract_patient_data(name: &str) -> Identity {
    let tokens = normalize(tokenize(name));
    let (tokens, birthday) = extract_birthday(tokens);
    let tokens = subsplit(tokens);
    let (tokens, case_nr) = isolate_case_and_doctor(tokens);
    let (first_name, last_name) = assemble_names(&tokens);
    Identity {
        first_name,
        last_name,
        birthday,
        case_nr,
    }
}

fn tokenize(name: &str) -> Vec<String> {
    name.split(' ').map(str::to_string).collect()
}

/// Strip the birthdate prefix marker, trim enclosing punctuation and drop
/// stopwords and empty tokens.
fn normalize(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .filter_map(|token| {
            let token = if token
                .get(..BIRTHDATE_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BIRTHDATE_PREFIX))
            {
                token[BIRTHDATE_PREFIX.len()..].to_string()
            } else {
                token
            };
            let token = token
                .trim_matches(|c| matches!(c, ' ' | ',' | '-' | '.'))
                .to_string();
            if token.is_empty() || STOPWORDS.contains(&token.to_lowercase().as_str()) {
                return None;
            }
            Some(token)
        })
        .collect()
}

/// The first token that parses as a calendar date becomes the birthday and is
/// replaced in-stream by the sentinel. A token that merely looks numeric but
/// fails date parsing is not a birthday.
fn extract_birthday(tokens: Vec<String>) -> (Vec<Token>, Option<String>) {
    let mut birthday = None;
    let stream = tokens
        .into_iter()
        .map(|token| {
            if birthday.is_none() && dates::parse_flexible(&token).is_some() {
                birthday = Some(token);
                Token::Birthday
            } else {
                Token::Word(token)
            }
        })
        .collect();
    (stream, birthday)
}

/// Split tokens on internal commas and periods; empty sub-tokens vanish.
/// This is what turns `"Dr."` into a bare `Dr` for the isolation stage.
fn subsplit(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::Birthday => out.push(Token::Birthday),
            Token::Word(word) => out.extend(
                word.split(&[',', '.'][..])
                    .filter(|part| !part.is_empty())
                    .map(|part| Token::Word(part.to_string())),
            ),
        }
    }
    out
}

fn is_doctor_title(lower: &str) -> bool {
    lower == "dr"
        || lower == "prof"
        || (lower.chars().count() == 1 && lower.chars().all(char::is_alphabetic))
}

/// Left-to-right scan that removes the treating physician's name, ward
/// annotations and numeric noise, and captures the case number.
fn isolate_case_and_doctor(tokens: Vec<Token>) -> (Vec<Token>, Option<String>) {
    let mut case_nr = None;
    let mut pending_doctor = false;
    let mut out = Vec::new();
    for token in tokens {
        let word = match token {
            Token::Birthday => {
                out.push(Token::Birthday);
                continue;
            }
            Token::Word(word) => word,
        };
        let lower = word.to_lowercase();
        if is_doctor_title(&lower) {
            // Chained titles ("Prof. Dr.") keep the skip pending for the
            // actual surname.
            pending_doctor = true;
            continue;
        }
        if pending_doctor {
            pending_doctor = false;
            if word.chars().count() > SHORT_SURNAME_LEN {
                continue;
            }
        }
        if DEPARTMENT_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            if word.len() > CASE_NR_MIN_DIGITS && case_nr.is_none() {
                case_nr = Some(word);
            }
            continue;
        }
        out.push(Token::Word(word));
    }
    (out, case_nr)
}

/// First remaining word is the first name; the second, if present before the
/// birthday sentinel, starts the last name; further words up to the sentinel
/// extend it (multi-word surnames).
fn assemble_names(tokens: &[Token]) -> (Option<String>, Option<String>) {
    let mut first_name: Option<String> = None;
    let mut last_name: Option<String> = None;
    for token in tokens {
        match token {
            Token::Birthday => {
                if first_name.is_some() {
                    break;
                }
            }
            Token::Word(word) => {
                if first_name.is_none() {
                    first_name = Some(word.clone());
                } else if let Some(last) = last_name.as_mut() {
                    last.push(' ');
                    last.push_str(word);
                } else {
                    last_name = Some(word.clone());
                }
            }
        }
    }
    (first_name, last_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_folder_name_is_decomposed() {
        let id = extract_patient_data("Mueller, Hans geb. 12.03.1950 Dr. Schmidt 123456");
        assert_eq!(id.first_name.as_deref(), Some("Mueller"));
        assert_eq!(id.last_name.as_deref(), Some("Hans"));
        assert_eq!(id.birthday.as_deref(), Some("12.03.1950"));
        assert_eq!(id.case_nr.as_deref(), Some("123456"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let name = "Mueller, Hans geb. 12.03.1950 Dr. Schmidt 123456";
        assert_eq!(extract_patient_data(name), extract_patient_data(name));
    }

    #[test]
    fn administrative_folder_yields_no_case_number() {
        let id = extract_patient_data("Arch");
        assert!(!id.is_patient());
        assert_eq!(id.first_name.as_deref(), Some("Arch"));

        assert!(!extract_patient_data("Wunddoku").is_patient());
        assert!(!extract_patient_data("Stomadoku").is_patient());
    }

    #[test]
    fn glued_birthdate_prefix_is_stripped() {
        let id = extract_patient_data("Meier Anna geb.01.02.1980 654321");
        assert_eq!(id.birthday.as_deref(), Some("01.02.1980"));
        assert_eq!(id.case_nr.as_deref(), Some("654321"));
    }

    #[test]
    fn six_digit_number_is_a_case_number_not_a_birthday() {
        let id = extract_patient_data("Berger Eva 123456");
        assert_eq!(id.birthday, None);
        assert_eq!(id.case_nr.as_deref(), Some("123456"));
    }

    #[test]
    fn short_numbers_are_noise() {
        let id = extract_patient_data("Berger Eva 12345 Zimmer 4");
        assert_eq!(id.case_nr, None);
        assert_eq!(id.first_name.as_deref(), Some("Berger"));
        assert_eq!(id.last_name.as_deref(), Some("Eva Zimmer"));
    }

    #[test]
    fn first_long_number_wins_as_case_number() {
        let id = extract_patient_data("Berger Eva 123456 789012");
        assert_eq!(id.case_nr.as_deref(), Some("123456"));
    }

    #[test]
    fn chained_doctor_titles_skip_only_the_surname() {
        let id = extract_patient_data("Huber, Karl Prof. Dr. Wagner 987654");
        assert_eq!(id.first_name.as_deref(), Some("Huber"));
        assert_eq!(id.last_name.as_deref(), Some("Karl"));
        assert_eq!(id.case_nr.as_deref(), Some("987654"));
    }

    #[test]
    fn very_short_token_after_title_is_not_swallowed() {
        // "Ng" is a real two-letter surname; the doctor-name skip must not
        // consume it.
        let id = extract_patient_data("Dr. Ng 123456");
        assert_eq!(id.first_name.as_deref(), Some("Ng"));
        assert_eq!(id.case_nr.as_deref(), Some("123456"));
    }

    #[test]
    fn honorifics_and_filler_are_dropped() {
        let id = extract_patient_data("Frau Keller, Rosa geb. 05.06.1940 234567");
        assert_eq!(id.first_name.as_deref(), Some("Keller"));
        assert_eq!(id.last_name.as_deref(), Some("Rosa"));
        assert_eq!(id.birthday.as_deref(), Some("05.06.1940"));
    }

    #[test]
    fn case_number_label_is_dropped() {
        let id = extract_patient_data("Keller Rosa Fall-Nr. 234567");
        assert_eq!(id.first_name.as_deref(), Some("Keller"));
        assert_eq!(id.last_name.as_deref(), Some("Rosa"));
        assert_eq!(id.case_nr.as_deref(), Some("234567"));
    }

    #[test]
    fn department_annotations_are_dropped() {
        let id = extract_patient_data("Keller Rosa Wundstation 234567");
        assert_eq!(id.last_name.as_deref(), Some("Rosa"));
    }

    #[test]
    fn multi_word_surname_stops_at_the_birthday() {
        let id = extract_patient_data("Maria von Habsburg 12.05.1960 345678 Ignored");
        assert_eq!(id.first_name.as_deref(), Some("Maria"));
        assert_eq!(id.last_name.as_deref(), Some("von Habsburg"));
        assert_eq!(id.birthday.as_deref(), Some("12.05.1960"));
        assert_eq!(id.case_nr.as_deref(), Some("345678"));
    }

    #[test]
    fn empty_and_garbage_input_degrade_to_none() {
        assert_eq!(extract_patient_data(""), Identity::default());
        assert_eq!(extract_patient_data("  - , .  "), Identity::default());
    }

    #[test]
    fn first_parseable_token_wins_as_birthday() {
        let id = extract_patient_data("Maier Jo 01.02.1950 03.04.1960 456789");
        assert_eq!(id.birthday.as_deref(), Some("01.02.1950"));
    }
}
