// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

/// Locale names accepted as the first part of a collation name.
const LOCALES: &[&str] = &[
	"Albanian",
	"Arabic",
	"Assamese",
	"Azeri_Cyrillic",
	"Azeri_Latin",
	"Bashkir",
	"Bengali",
	"Bosnian_Cyrillic",
	"Bosnian_Latin",
	"Breton",
	"Chinese_Hong_Kong_Stroke",
	"Chinese_PRC",
	"Chinese_PRC_Stroke",
	"Chinese_Simplified_Pinyin",
	"Chinese_Simplified_Stroke_Order",
	"Chinese_Taiwan_Bopomofo",
	"Chinese_Taiwan_Stroke",
	"Chinese_Traditional_Bopomofo",
	"Chinese_Traditional_Pinyin",
	"Chinese_Traditional_Stroke_Count",
	"Chinese_Traditional_Stroke_Order",
	"Corsican",
	"Croatian",
	"Cyrillic_General",
	"Czech",
	"Danish_Greenlandic",
	"Danish_Norwegian",
	"Dari",
	"Divehi",
	"Estonian",
	"Finnish_Swedish",
	"French",
	"Frisian",
	"Georgian_Modern_Sort",
	"German_PhoneBook",
	"Greek",
	"Hebrew",
	"Hindi",
	"Hungarian",
	"Hungarian_Technical",
	"Icelandic",
	"Indic_General",
	"Japanese",
	"Japanese_Bushu_Kakusu",
	"Japanese_Unicode",
	"Japanese_XJIS",
	"Kazakh",
	"Khmer",
	"Korean",
	"Korean_Wansung",
	"Lao",
	"Latin1_General",
	"Latvian",
	"Lithuanian",
	"Macedonian_FYROM",
	"Maltese",
	"Maori",
	"Mapudungan",
	"Modern_Spanish",
	"Mohawk",
	"Nepali",
	"Norwegian",
	"Pashto",
	"Persian",
	"Polish",
	"Romanian",
	"Romansh",
	"Sami_Norway",
	"Sami_Sweden_Finland",
	"Serbian_Cyrillic",
	"Serbian_Latin",
	"Slovak",
	"Slovenian",
	"Syriac",
	"Tamazight",
	"Tatar",
	"Thai",
	"Tibetan",
	"Traditional_Spanish",
	"Turkish",
	"Turkmen",
	"Uighur",
	"Ukrainian",
	"Upper_Sorbian",
	"Urdu",
	"Uzbek_Latin",
	"Vietnamese",
	"Welsh",
	"Yakut",
];

/// Locales whose case mapping pairs dotted and dotless I.
const DOTTED_I_LOCALES: &[&str] = &["Turkish", "Azeri_Latin", "Azeri_Cyrillic", "Kazakh", "Tatar"];

/// Canonical spelling of a locale name, matched case-insensitively.
pub fn lookup(name: &str) -> Option<&'static str> {
	LOCALES.iter().copied().find(|locale| locale.eq_ignore_ascii_case(name))
}

pub fn has_dotted_i(locale: &str) -> bool {
	DOTTED_I_LOCALES.iter().any(|l| l.eq_ignore_ascii_case(locale))
}
