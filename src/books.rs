//! Fixed book dictionaries for scope extraction.
//!
//! Three lookup families, in Korean and English:
//! - book groups (e.g. "사복음서" / "four gospels" -> member book codes)
//! - full book names -> short codes
//!
//! Group entries are ordered so that longer, more specific names match
//! before their substrings (e.g. "사복음서" before "복음서").

/// Book group name -> member book short codes, Korean.
pub const BOOK_GROUPS_KR: &[(&str, &[&str])] = &[
    ("사복음서", &["마", "막", "눅", "요"]),
    ("복음서", &["마", "막", "눅", "요"]),
    ("모세오경", &["창", "출", "레", "민", "신"]),
    ("율법서", &["창", "출", "레", "민", "신"]),
    (
        "역사서",
        &["수", "삿", "룻", "삼상", "삼하", "왕상", "왕하", "대상", "대하", "스", "느", "에"],
    ),
    ("시가서", &["욥", "시", "잠", "전", "아"]),
    ("지혜서", &["욥", "시", "잠", "전", "아"]),
    ("대선지서", &["사", "렘", "애", "겔", "단"]),
    (
        "소선지서",
        &["호", "욜", "암", "옵", "욘", "미", "나", "합", "습", "학", "슥", "말"],
    ),
    (
        "바울서신",
        &["롬", "고전", "고후", "갈", "엡", "빌", "골", "살전", "살후", "딤전", "딤후", "딛", "몬"],
    ),
    ("일반서신", &["히", "약", "벧전", "벧후", "요일", "요이", "요삼", "유"]),
    ("공동서신", &["히", "약", "벧전", "벧후", "요일", "요이", "요삼", "유"]),
];

/// Book group name -> member book short codes, English (lowercase keys).
pub const BOOK_GROUPS_EN: &[(&str, &[&str])] = &[
    ("four gospels", &["Matt", "Mark", "Luke", "John"]),
    ("gospels", &["Matt", "Mark", "Luke", "John"]),
    ("pentateuch", &["Gen", "Ex", "Lev", "Num", "Deut"]),
    ("torah", &["Gen", "Ex", "Lev", "Num", "Deut"]),
    ("wisdom books", &["Job", "Ps", "Prov", "Eccl", "Song"]),
    ("major prophets", &["Isa", "Jer", "Lam", "Ezek", "Dan"]),
    (
        "minor prophets",
        &["Hos", "Joel", "Amos", "Obad", "Jonah", "Mic", "Nah", "Hab", "Zeph", "Hag", "Zech", "Mal"],
    ),
    (
        "pauline epistles",
        &[
            "Rom", "1Cor", "2Cor", "Gal", "Eph", "Phil", "Col", "1Thess", "2Thess", "1Tim",
            "2Tim", "Titus", "Philem",
        ],
    ),
    (
        "general epistles",
        &["Heb", "Jas", "1Pet", "2Pet", "1John", "2John", "3John", "Jude"],
    ),
];

/// Full Korean book name -> short code.
pub const BOOK_NAMES_KR: &[(&str, &str)] = &[
    // Old Testament
    ("창세기", "창"),
    ("출애굽기", "출"),
    ("레위기", "레"),
    ("민수기", "민"),
    ("신명기", "신"),
    ("여호수아", "수"),
    ("사사기", "삿"),
    ("룻기", "룻"),
    ("사무엘상", "삼상"),
    ("사무엘하", "삼하"),
    ("열왕기상", "왕상"),
    ("열왕기하", "왕하"),
    ("역대상", "대상"),
    ("역대하", "대하"),
    ("에스라", "스"),
    ("느헤미야", "느"),
    ("에스더", "에"),
    ("욥기", "욥"),
    ("시편", "시"),
    ("잠언", "잠"),
    ("전도서", "전"),
    ("아가", "아"),
    ("이사야", "사"),
    ("예레미야", "렘"),
    ("예레미아", "렘"),
    ("애가", "애"),
    ("에스겔", "겔"),
    ("다니엘", "단"),
    ("호세아", "호"),
    ("요엘", "욜"),
    ("아모스", "암"),
    ("오바댜", "옵"),
    ("요나", "욘"),
    ("미가", "미"),
    ("나훔", "나"),
    ("하박국", "합"),
    ("스바냐", "습"),
    ("학개", "학"),
    ("스가랴", "슥"),
    ("말라기", "말"),
    // New Testament
    ("마태복음", "마"),
    ("마가복음", "막"),
    ("누가복음", "눅"),
    ("요한복음", "요"),
    ("사도행전", "행"),
    ("로마서", "롬"),
    ("고린도전서", "고전"),
    ("고린도후서", "고후"),
    ("갈라디아서", "갈"),
    ("에베소서", "엡"),
    ("빌립보서", "빌"),
    ("골로새서", "골"),
    ("데살로니가전서", "살전"),
    ("데살로니가후서", "살후"),
    ("디모데전서", "딤전"),
    ("디모데후서", "딤후"),
    ("디도서", "딛"),
    ("빌레몬서", "몬"),
    ("히브리서", "히"),
    ("야고보서", "약"),
    ("베드로전서", "벧전"),
    ("베드로후서", "벧후"),
    ("요한일서", "요일"),
    ("요한이서", "요이"),
    ("요한삼서", "요삼"),
    ("유다서", "유"),
    ("요한계시록", "계"),
    ("계시록", "계"),
];

/// Full English book name (lowercase) -> short code.
pub const BOOK_NAMES_EN: &[(&str, &str)] = &[
    ("genesis", "Gen"),
    ("exodus", "Ex"),
    ("leviticus", "Lev"),
    ("numbers", "Num"),
    ("deuteronomy", "Deut"),
    ("joshua", "Josh"),
    ("judges", "Judg"),
    ("ruth", "Ruth"),
    ("1 samuel", "1Sam"),
    ("2 samuel", "2Sam"),
    ("1 kings", "1Kgs"),
    ("2 kings", "2Kgs"),
    ("1 chronicles", "1Chr"),
    ("2 chronicles", "2Chr"),
    ("ezra", "Ezra"),
    ("nehemiah", "Neh"),
    ("esther", "Esth"),
    ("job", "Job"),
    ("psalms", "Ps"),
    ("proverbs", "Prov"),
    ("ecclesiastes", "Eccl"),
    ("song of solomon", "Song"),
    ("isaiah", "Isa"),
    ("jeremiah", "Jer"),
    ("lamentations", "Lam"),
    ("ezekiel", "Ezek"),
    ("daniel", "Dan"),
    ("hosea", "Hos"),
    ("joel", "Joel"),
    ("amos", "Amos"),
    ("obadiah", "Obad"),
    ("jonah", "Jonah"),
    ("micah", "Mic"),
    ("nahum", "Nah"),
    ("habakkuk", "Hab"),
    ("zephaniah", "Zeph"),
    ("haggai", "Hag"),
    ("zechariah", "Zech"),
    ("malachi", "Mal"),
    ("matthew", "Matt"),
    ("mark", "Mark"),
    ("luke", "Luke"),
    ("john", "John"),
    ("acts", "Acts"),
    ("romans", "Rom"),
    ("1 corinthians", "1Cor"),
    ("2 corinthians", "2Cor"),
    ("galatians", "Gal"),
    ("ephesians", "Eph"),
    ("philippians", "Phil"),
    ("colossians", "Col"),
    ("1 thessalonians", "1Thess"),
    ("2 thessalonians", "2Thess"),
    ("1 timothy", "1Tim"),
    ("2 timothy", "2Tim"),
    ("titus", "Titus"),
    ("philemon", "Philem"),
    ("hebrews", "Heb"),
    ("james", "Jas"),
    ("1 peter", "1Pet"),
    ("2 peter", "2Pet"),
    ("1 john", "1John"),
    ("2 john", "2John"),
    ("3 john", "3John"),
    ("jude", "Jude"),
    ("revelation", "Rev"),
];

/// Find a book group whose name appears inside `scope`.
pub fn find_group(scope: &str, korean: bool) -> Option<(&'static str, &'static [&'static str])> {
    let groups = if korean { BOOK_GROUPS_KR } else { BOOK_GROUPS_EN };
    let scope_lower = scope.to_lowercase();
    groups
        .iter()
        .find(|(name, _)| scope_lower.contains(&name.to_lowercase()))
        .map(|&(name, books)| (name, books))
}

/// Find a single book whose full name appears inside `part`.
pub fn find_book(part: &str, korean: bool) -> Option<(&'static str, &'static str)> {
    let names = if korean { BOOK_NAMES_KR } else { BOOK_NAMES_EN };
    let part_lower = part.to_lowercase();
    names
        .iter()
        .find(|(name, _)| part_lower.contains(&name.to_lowercase()))
        .map(|&(name, short)| (name, short))
}
