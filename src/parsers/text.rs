use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Function words that carry no topical signal
///
/// The site content is Portuguese, so is the list.
pub const STOPWORDS: &[&str] = &[
    "de", "a", "o", "que", "e", "do", "da", "em", "um", "para", "é", "com", "não", "uma", "os",
    "no", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele", "das", "tem", "à",
    "seu", "sua", "ou", "ser", "quando", "muito", "há", "nos", "já", "está", "eu", "também", "só",
    "pelo", "pela", "até", "isso", "ela", "entre", "era", "depois", "sem", "mesmo", "aos", "ter",
    "seus", "quem", "nas", "me", "esse", "eles", "estão", "você", "tinha", "foram", "essa", "num",
    "nem", "suas", "meu", "às", "minha", "têm", "numa", "pelos", "elas", "havia", "seja", "qual",
    "será", "nós", "tenho", "lhe", "deles", "essas", "esses", "pelas", "este", "fosse", "dele",
    "tu", "te", "vocês", "vos", "lhes", "meus", "minhas", "teu", "tua", "teus", "tuas", "nosso",
    "nossa", "nossos", "nossas", "dela", "delas", "esta", "estes", "estas", "aquele", "aquela",
    "aqueles", "aquelas", "isto", "aquilo", "estou", "estamos", "estive", "esteve", "estivemos",
    "estiveram", "estava", "estávamos", "estavam", "estivera", "estivéramos", "esteja",
    "estejamos", "estejam", "estivesse", "estivéssemos", "estivessem", "estiver", "estivermos",
    "estiverem", "hei", "havemos", "hão", "houve", "houvemos", "houveram", "houvera",
    "houvéramos", "haja", "hajamos", "hajam", "houvesse", "houvéssemos", "houvessem", "houver",
    "houvermos", "houverem", "houverei", "houverá", "houveremos", "houverão", "houveria",
    "houveríamos", "houveriam", "sou", "somos", "são", "éramos", "eram", "fui", "fomos", "fora",
    "fôramos", "sejamos", "sejam", "fôssemos", "fossem", "for", "formos", "forem", "serei",
    "seremos", "serão", "seria", "seríamos", "seriam", "temos", "tém", "tínhamos", "tinham",
    "tive", "teve", "tivemos", "tiveram", "tivera", "tivéramos", "tenha", "tenhamos", "tenham",
    "tivesse", "tivéssemos", "tivessem", "tiver", "tivermos", "tiverem", "terei", "terá",
    "teremos", "terão", "teria", "teríamos", "teriam", "sobre", "qualquer", "todo", "todos",
    "toda", "todas", "outro", "outra", "outros", "outras", "tal", "tais", "mesma", "mesmos",
    "mesmas", "grande", "pequeno", "pouco", "muita", "algum", "alguma", "alguns", "algumas",
    "assim", "então", "logo", "porque", "pois", "onde", "enquanto", "sempre", "nunca", "agora",
    "hoje", "ontem", "amanhã", "cedo", "tarde", "aqui", "ali", "lá", "dentro", "acima", "abaixo",
    "frente", "atrás", "cada", "coisa", "caso", "cujo", "etc", "mim", "si", "consigo", "tipo",
    "ainda", "poder", "pode", "deve", "devem", "fazer", "dizer", "quer", "quê", "àquele",
    "àquela", "naquele", "naquela", "neste", "nesta", "nisto", "nisso", "daqui", "dali", "desta",
    "deste", "daquele", "daquela",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Words of three or more letters, accented Portuguese letters and hyphens included
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-záéíóúâêôãõçüA-ZÁÉÍÓÚÂÊÔÃÕÇÜ-]{3,}\b").expect("word pattern is valid")
});

/// Characters kept on each side of a match when cutting a snippet
pub const SNIPPET_RADIUS: usize = 60;

pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word)
}

/// Lowercases `text` and returns its words of 3+ letters that are not stopwords
pub fn significant_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| !is_stopword(word))
        .map(str::to_string)
        .collect()
}

/// The copy of a page's text used for term matching
pub fn matching_text(text: &str) -> String {
    significant_words(text).join(" ")
}

/// Parses a comma-separated keywords attribute
///
/// Keywords are trimmed and lowercased; anything of two characters or less
/// and any stopword is dropped.
pub fn keyword_set(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| keyword.chars().count() > 2 && !is_stopword(keyword))
        .collect()
}

/// Case-insensitive whole-word pattern for a term
pub fn term_pattern(term: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).ok()
}

/// Byte range of the first whole-word occurrence of `term` in `haystack`
pub fn find_term(haystack: &str, term: &str) -> Option<(usize, usize)> {
    term_pattern(term)?
        .find(haystack)
        .map(|m| (m.start(), m.end()))
}

pub fn contains_term(haystack: &str, term: &str) -> bool {
    find_term(haystack, term).is_some()
}

/// Cuts the text around `start..end`, keeping `radius` characters each side
pub fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}

/// Builds a `...context...` snippet around the match range
pub fn snippet(text: &str, start: usize, end: usize) -> String {
    let cut = window(text, start, end, SNIPPET_RADIUS);
    format!("...{}...", normalize_whitespace(cut))
}

/// Wraps every whole-word occurrence of each term in `**`
pub fn emphasize<'a>(text: &str, terms: impl IntoIterator<Item = &'a String>) -> String {
    let mut out = text.to_string();
    for term in terms {
        if let Some(pattern) = term_pattern(term) {
            out = pattern.replace_all(&out, "**${0}**").into_owned();
        }
    }
    out
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn normalize_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
