use crate::error::CatalogError;

/// Display name to FLORES-200 tag, for the translation path.
///
/// A curated slice of the NLLB-200 language list: enough for the UI
/// picker this engine serves. Tags outside this table are still accepted
/// anywhere a tag is taken directly, as long as they are well formed.
pub const LANGUAGES: &[(&str, &str)] = &[
	("Arabic", "arb_Arab"),
	("Bengali", "ben_Beng"),
	("Chinese (Simplified)", "zho_Hans"),
	("Czech", "ces_Latn"),
	("Danish", "dan_Latn"),
	("Dutch", "nld_Latn"),
	("English", "eng_Latn"),
	("Finnish", "fin_Latn"),
	("French", "fra_Latn"),
	("German", "deu_Latn"),
	("Greek", "ell_Grek"),
	("Hebrew", "heb_Hebr"),
	("Hindi", "hin_Deva"),
	("Hungarian", "hun_Latn"),
	("Indonesian", "ind_Latn"),
	("Italian", "ita_Latn"),
	("Japanese", "jpn_Jpan"),
	("Korean", "kor_Hang"),
	("Norwegian", "nob_Latn"),
	("Polish", "pol_Latn"),
	("Portuguese", "por_Latn"),
	("Romanian", "ron_Latn"),
	("Russian", "rus_Cyrl"),
	("Spanish", "spa_Latn"),
	("Swahili", "swh_Latn"),
	("Swedish", "swe_Latn"),
	("Thai", "tha_Thai"),
	("Turkish", "tur_Latn"),
	("Ukrainian", "ukr_Cyrl"),
	("Vietnamese", "vie_Latn"),
];

/// Look up the FLORES-200 tag for a display name.
pub fn tag_for_name(name: &str) -> Option<&'static str> {
	LANGUAGES.iter().find(|(n, _)| *n == name).map(|(_, tag)| *tag)
}

/// Whether `tag` has the FLORES-200 shape: `xxx_Yyyy` with a lowercase
/// three-letter language code and a four-letter script code.
pub fn is_valid_tag(tag: &str) -> bool {
	let bytes = tag.as_bytes();
	if bytes.len() != 8 || bytes[3] != b'_' {
		return false;
	}
	let lang_ok = bytes[..3].iter().all(u8::is_ascii_lowercase);
	let script_ok = bytes[4].is_ascii_uppercase() && bytes[5..].iter().all(u8::is_ascii_alphabetic);
	lang_ok && script_ok
}

/// Validate a tag, keeping the offending value in the error.
pub fn validate_tag(tag: &str) -> Result<(), CatalogError> {
	if is_valid_tag(tag) {
		Ok(())
	} else {
		Err(CatalogError::InvalidLanguageTag(tag.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn catalog_tags_are_all_well_formed() {
		for (name, tag) in LANGUAGES {
			assert!(is_valid_tag(tag), "{name} carries malformed tag {tag}");
		}
	}

	#[test]
	fn name_lookup_finds_french() {
		assert_eq!(tag_for_name("French"), Some("fra_Latn"));
		assert_eq!(tag_for_name("Klingon"), None);
	}

	#[test]
	fn malformed_tags_are_rejected() {
		for tag in ["", "fr", "fra-Latn", "FRA_Latn", "fra_latn", "fra_Latn2", "fra_Latn_x"] {
			assert!(validate_tag(tag).is_err(), "{tag:?} should not validate");
		}
	}
}
