use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}_]+").expect("valid regex");
    static ref ENGLISH_STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref FRENCH_STEMMER: Stemmer = Stemmer::create(Algorithm::French);
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        // Contractions are split on the apostrophe, so their fragments are listed too.
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","couldn",
            "d","did","didn","do","does","doesn","doing","don","down","during",
            "each","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","it","its","itself",
            "just","ll","m","me","more","most","mustn","my","myself",
            "no","nor","not","now","o","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "re","s","same","shan","she","should","shouldn","so","some","such",
            "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","we","were","weren","what","when","where","which","while","who","whom","why","will","with","won","would","wouldn",
            "y","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref FRENCH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "à","ai","aie","aient","aies","ait","as","au","aura","aurai","auraient","aurais","aurait","auras","aurez",
            "auriez","aurions","aurons","auront","aux","avaient","avais","avait","avec","avez","aviez","avions","avons",
            "ayant","ayante","ayantes","ayants","ayez","ayons",
            "c","ce","ces","d","dans","de","des","du",
            "elle","en","es","est","et","étaient","étais","était","étant","étante","étantes","étants","été","étée",
            "étées","étés","êtes","étiez","étions","eu","eue","eues","eûmes","eurent","eus","eusse","eussent","eusses",
            "eussiez","eussions","eut","eût","eûtes","eux",
            "fûmes","furent","fus","fusse","fussent","fusses","fussiez","fussions","fut","fût","fûtes",
            "il","ils","j","je","l","la","le","les","leur","lui",
            "m","ma","mais","me","même","mes","moi","mon","n","ne","nos","notre","nous",
            "on","ont","ou","par","pas","pour","qu","que","qui",
            "s","sa","se","sera","serai","seraient","serais","serait","seras","serez","seriez","serions","serons","seront",
            "ses","soient","sois","soit","sommes","son","sont","soyez","soyons","suis","sur",
            "t","ta","te","tes","toi","ton","tu","un","une","vos","votre","vous","y"
        ];
        words.iter().copied().collect()
    };
}

/// Language of a corpus. Selects the stop-word table and the Snowball stemmer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    fn stemmer(self) -> &'static Stemmer {
        match self {
            Language::English => &*ENGLISH_STEMMER,
            Language::French => &*FRENCH_STEMMER,
        }
    }

    fn stopwords(self) -> &'static HashSet<&'static str> {
        match self {
            Language::English => &*ENGLISH_STOPWORDS,
            Language::French => &*FRENCH_STOPWORDS,
        }
    }

    pub fn is_stopword(self, token: &str) -> bool {
        self.stopwords().contains(token.to_lowercase().as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "fr" => Ok(Language::French),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("english"),
            Language::French => f.write_str("french"),
        }
    }
}

/// Normalize text into stemmed terms: NFKC, lowercase, split on word-character runs,
/// drop stop-words, stem. Terms keep their left-to-right order.
pub fn tokenize(text: &str, language: Language) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let stemmer = language.stemmer();
    let stopwords = language.stopwords();
    RE.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !stopwords.contains(token))
        .map(|token| stemmer.stem(token).into_owned())
        .collect()
}
