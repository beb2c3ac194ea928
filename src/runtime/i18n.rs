//! Diagnostic translation boundary.
//!
//! The interpreter and parser emit canonical English messages; translation
//! happens only where diagnostics leave the process (the CLI's stderr).
//! `CLOT_LANG` or `--lang` selects the language.

/// Supported diagnostic languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

/// Resolve the requested language from a CLI flag, falling back to the
/// `CLOT_LANG` environment variable and then to English.
pub fn language_from(flag: Option<&str>) -> Result<Language, String> {
    let requested = match flag {
        Some(value) => Some(value.to_string()),
        None => std::env::var("CLOT_LANG").ok(),
    };

    match requested.as_deref() {
        None | Some("en") => Ok(Language::English),
        Some("es") => Ok(Language::Spanish),
        Some(other) => Err(format!("invalid language '{}'; use es or en", other)),
    }
}

/// Prefix-based rules mapping canonical English messages to Spanish. Error
/// kind names (`NameError`, ...) are canonical and stay untranslated.
const PREFIX_RULES: &[(&str, &str)] = &[
    ("undefined variable: ", "variable no definida: "),
    ("undefined function: ", "funcion no definida: "),
    ("property not found: ", "propiedad no encontrada: "),
    ("invalid property access: ", "acceso de propiedad invalido: "),
    (
        "cannot access property on a non-object value: ",
        "no se puede acceder propiedad en un valor no objeto: ",
    ),
    (
        "expression requires a numeric value",
        "la expresion requiere un valor numerico",
    ),
    (
        "only lists can be indexed with []",
        "solo se puede indexar una lista con []",
    ),
    (
        "only lists can be mutated with []",
        "solo se puede mutar una lista con []",
    ),
    (
        "list index must be a finite integer",
        "el indice de lista debe ser un entero finito",
    ),
    ("list index out of bounds", "indice fuera de rango en lista"),
    ("value out of range for long", "valor fuera de rango para long"),
    (
        "value out of range for byte (0-255)",
        "valor fuera de rango para byte (0-255)",
    ),
    (
        "wrong number of arguments for function ",
        "numero incorrecto de argumentos para funcion ",
    ),
    (
        "return is only allowed inside a function",
        "return solo se permite dentro de una funcion",
    ),
    (
        "circular import detected in module: ",
        "import circular detectado en modulo: ",
    ),
    ("task id not found: ", "id de tarea no encontrado: "),
    (
        "task id must be a positive integer",
        "el id de tarea debe ser un entero positivo",
    ),
    ("could not open file: ", "no se pudo abrir el archivo: "),
    ("error writing file: ", "error escribiendo el archivo: "),
    ("error importing module ", "error importando modulo "),
    ("parse error importing module ", "error de parseo importando modulo "),
    ("unrecognized token: ", "token no reconocido: "),
    ("missing ';' at end of ", "falta ';' al final de "),
    ("expected an identifier", "se esperaba un identificador"),
    ("control token outside block: ", "token de control fuera de bloque: "),
    (
        "unsupported token in expression: ",
        "token no soportado en expresion: ",
    ),
    ("incomplete expression", "expresion incompleta"),
];

/// Translate a canonical message, leaving any `Kind:`/position prefix in
/// place. Messages without a rule pass through unchanged.
pub fn translate(language: Language, message: &str) -> String {
    if language == Language::English {
        return message.to_string();
    }

    // The translatable part starts after "SomeError: " or "line L, column C: ".
    let body_start = message
        .match_indices(": ")
        .map(|(index, _)| index + 2)
        .find(|&start| {
            PREFIX_RULES
                .iter()
                .any(|(english, _)| message[start..].starts_with(english))
        });

    let start = match body_start {
        Some(start) => start,
        None if PREFIX_RULES
            .iter()
            .any(|(english, _)| message.starts_with(english)) =>
        {
            0
        }
        None => return message.to_string(),
    };

    let (head, body) = message.split_at(start);
    for (english, spanish) in PREFIX_RULES {
        if let Some(rest) = body.strip_prefix(english) {
            return format!("{}{}{}", head, spanish, rest);
        }
    }

    message.to_string()
}
