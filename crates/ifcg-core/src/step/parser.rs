//! ISO-10303-21 (STEP) reader using nom.
//!
//! The file is cut into `;`-terminated statements first (string aware), then
//! each `#id=TYPE(args)` statement is tokenized with nom combinators.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use tracing::{debug, warn};

use super::model::{AttributeValue, StepEntity, StepModel};
use crate::error::{IfcgError, IfcgResult};
use crate::schema::IfcClass;

/// Parse a whole STEP file.
pub fn parse_step(content: &str) -> IfcgResult<StepModel> {
    let cleaned = strip_comments(content);
    let statements = split_statements(&cleaned);

    let data_start = statements
        .iter()
        .position(|s| s.trim() == "DATA")
        .ok_or(IfcgError::MissingDataSection)?;

    let schema = statements[..data_start]
        .iter()
        .find_map(|s| header_schema(s.trim()));

    let mut model = StepModel::new(schema);
    for statement in &statements[data_start + 1..] {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        if statement == "ENDSEC" {
            break;
        }
        match parse_statement(statement)? {
            Some(entity) => model.push(entity),
            None => model.skipped += 1,
        }
    }

    debug!(
        entities = model.len(),
        skipped = model.skipped,
        schema = model.schema.as_deref().unwrap_or("unknown"),
        "STEP file decoded"
    );
    Ok(model)
}

/// Parse one data statement (without its trailing `;`).
///
/// Returns `Ok(None)` for complex instances `#n=(A() B())`, which carry
/// several types at once and are not decoded.
pub fn parse_statement(statement: &str) -> IfcgResult<Option<StepEntity>> {
    let (rest, id) = entity_id(statement)
        .map_err(|_| IfcgError::parse(0, format!("expected '#<id>=' in: {}", preview(statement))))?;

    if rest.trim_start().starts_with('(') {
        warn!(id, "Skipping complex entity instance");
        return Ok(None);
    }

    let (_, (type_name, attributes)) = all_consuming(entity_body)(rest)
        .map_err(|e| IfcgError::parse(id, format!("{:?}", e)))?;

    Ok(Some(StepEntity {
        id,
        class: IfcClass::from_step_name(type_name),
        attributes,
    }))
}

fn preview(s: &str) -> &str {
    let end = s.char_indices().nth(60).map(|(i, _)| i).unwrap_or(s.len());
    &s[..end]
}

/// `FILE_SCHEMA(('IFC2X3'))` -> `IFC2X3`
fn header_schema(statement: &str) -> Option<String> {
    let rest = statement.strip_prefix("FILE_SCHEMA")?;
    let open = rest.find('\'')?;
    let close = rest[open + 1..].find('\'')?;
    Some(rest[open + 1..open + 1 + close].to_string())
}

/// Remove `/* ... */` comments that are not inside string literals.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                // a doubled quote stays inside the literal
                if chars.peek() == Some(&'\'') {
                    out.push('\'');
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for inner in chars.by_ref() {
                if prev == '*' && inner == '/' {
                    break;
                }
                prev = inner;
            }
            continue;
        }
        if c == '\'' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

/// Split on `;` outside string literals.
fn split_statements(content: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut in_string = false;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match c {
            // '' inside a string toggles twice, which is what we want
            '\'' => in_string = !in_string,
            ';' if !in_string => {
                statements.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    statements
}

fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

fn entity_id(input: &str) -> IResult<&str, u32> {
    delimited(
        ws,
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        tuple((ws, char('='), ws)),
    )(input)
}

fn type_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn entity_body(input: &str) -> IResult<&str, (&str, Vec<AttributeValue>)> {
    terminated(pair(type_name, delimited(ws, arguments, ws)), ws)(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<AttributeValue>> {
    delimited(
        char('('),
        separated_list0(char(','), value),
        preceded(ws, char(')')),
    )(input)
}

fn value(input: &str) -> IResult<&str, AttributeValue> {
    delimited(
        ws,
        alt((
            real,
            integer,
            entity_ref,
            string_literal,
            enum_value,
            map(arguments, AttributeValue::List),
            typed_value,
            map(char('$'), |_| AttributeValue::Null),
            map(char('*'), |_| AttributeValue::Derived),
        )),
        ws,
    )(input)
}

fn entity_ref(input: &str) -> IResult<&str, AttributeValue> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        AttributeValue::Ref,
    )(input)
}

fn integer(input: &str) -> IResult<&str, AttributeValue> {
    map_res(
        recognize(pair(opt(one_of("+-")), digit1)),
        |s: &str| s.parse::<i64>().map(AttributeValue::Integer),
    )(input)
}

/// Reals always carry a '.', possibly without fraction digits (`0.`).
fn real(input: &str) -> IResult<&str, AttributeValue> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().map(AttributeValue::Real),
    )(input)
}

fn enum_value(input: &str) -> IResult<&str, AttributeValue> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            char('.'),
        ),
        |s: &str| AttributeValue::Enum(s.to_string()),
    )(input)
}

fn typed_value(input: &str) -> IResult<&str, AttributeValue> {
    map(pair(type_name, preceded(ws, arguments)), |(name, args)| {
        AttributeValue::Typed(name.to_string(), args)
    })(input)
}

fn string_literal(input: &str) -> IResult<&str, AttributeValue> {
    map(
        delimited(char('\''), string_content, char('\'')),
        |raw| AttributeValue::String(decode_string(raw)),
    )(input)
}

/// Raw literal body up to the closing quote; `''` is an escaped quote.
fn string_content(input: &str) -> IResult<&str, &str> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Ok((&input[i..], &input[..i]));
        }
        i += 1;
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Undo STEP string encoding: `''`, `\\`, `\S\c`, `\X\hh` and `\X2\hhhh...\X0\`.
pub fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\'', '\\']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("''") {
            out.push('\'');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\\\") {
            out.push('\\');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\X2\\") {
            let end = after.find("\\X0\\").unwrap_or(after.len());
            let hex = &after[..end];
            for chunk in hex.as_bytes().chunks(4) {
                let decoded = std::str::from_utf8(chunk)
                    .ok()
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .and_then(char::from_u32);
                out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            rest = after.get(end + 4..).unwrap_or("");
        } else if let Some(after) = tail.strip_prefix("\\S\\") {
            // ISO 8859-1 upper half: code of the next character plus 0x80
            match after.chars().next().filter(char::is_ascii) {
                Some(c) => {
                    out.push(char::from(c as u8 + 0x80));
                    rest = &after[1..];
                }
                None => {
                    out.push_str("\\S\\");
                    rest = after;
                }
            }
        } else if let Some(after) = tail.strip_prefix("\\X\\") {
            match after.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &after[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = after;
                }
            }
        } else {
            out.push(tail.chars().next().unwrap_or_default());
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('house.ifc','2024-04-03T12:00:00',(''),('',''),'x','y','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
/* a comment; with a semicolon */
#1=IFCCARTESIANPOINT((0.,1.5,-2.E-3));
#2=IFCDIRECTION((0.,0.,1.));
#3=IFCWALLSTANDARDCASE('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall ''North''',$,$,
  #10,#11,$);
#4=(IFCLENGTHMEASURE(1.) IFCLABEL('x'));
#5=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_parse_sample_file() {
        let model = parse_step(SAMPLE).unwrap();
        assert_eq!(model.schema.as_deref(), Some("IFC2X3"));
        assert_eq!(model.len(), 4);
        assert_eq!(model.skipped, 1);

        let point = model.get(1).unwrap();
        assert_eq!(point.class, IfcClass::CartesianPoint);
        assert_eq!(
            point.attributes[0],
            AttributeValue::List(vec![
                AttributeValue::Real(0.0),
                AttributeValue::Real(1.5),
                AttributeValue::Real(-0.002),
            ])
        );

        let wall = model.get(3).unwrap();
        assert_eq!(wall.name(), Some("Wall 'North'"));
        assert_eq!(wall.attributes[5], AttributeValue::Ref(10));
        assert_eq!(wall.attributes.len(), 8);
    }

    #[test]
    fn test_typed_and_enum_values() {
        let entity = parse_statement("#5=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$)")
            .unwrap()
            .unwrap();
        assert_eq!(
            entity.attributes[2],
            AttributeValue::Typed("IFCBOOLEAN".into(), vec![AttributeValue::Enum("T".into())])
        );
        assert!(entity.attributes[3].is_null());
    }

    #[test]
    fn test_whitespace_before_typed_arguments() {
        let entity = parse_statement("#2=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN (.T.),$)")
            .unwrap()
            .unwrap();
        assert_eq!(
            entity.attributes[2],
            AttributeValue::Typed("IFCBOOLEAN".into(), vec![AttributeValue::Enum("T".into())])
        );

        let model = parse_step("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCLABEL ('x');\n#2=IFCFOO(IFCLABEL ('y'));\nENDSEC;\n").unwrap();
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_integer_and_derived() {
        let entity = parse_statement("#7 = IFCFOO(42, -3, *, ())").unwrap().unwrap();
        assert_eq!(entity.id, 7);
        assert_eq!(entity.attributes[0], AttributeValue::Integer(42));
        assert_eq!(entity.attributes[1], AttributeValue::Integer(-3));
        assert_eq!(entity.attributes[2], AttributeValue::Derived);
        assert_eq!(entity.attributes[3], AttributeValue::List(vec![]));
    }

    #[test]
    fn test_malformed_statement_reports_id() {
        let err = parse_statement("#9=IFCWALL('unterminated)").unwrap_err();
        match err {
            IfcgError::Parse { entity, .. } => assert_eq!(entity, 9),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_section() {
        let err = parse_step("ISO-10303-21;\nHEADER;\nENDSEC;\n").unwrap_err();
        assert!(matches!(err, IfcgError::MissingDataSection));
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string("it''s"), "it's");
        assert_eq!(decode_string("caf\\X2\\00E9\\X0\\"), "café");
        assert_eq!(decode_string("\\X\\E9t\\X\\E9"), "été");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
        assert_eq!(decode_string("plain"), "plain");
    }

    #[test]
    fn test_decode_upper_half_escape() {
        assert_eq!(decode_string("\\S\\D"), "\u{c4}");
        assert_eq!(decode_string("Stra\\S\\_e"), "Stra\u{df}e");
        assert_eq!(decode_string("trailing\\S\\"), "trailing\\S\\");
    }

    #[test]
    fn test_comment_with_quote_inside_string_kept() {
        let cleaned = strip_comments("#1=IFCLABEL('/* not a comment */');/* gone */");
        assert_eq!(cleaned, "#1=IFCLABEL('/* not a comment */');");
    }
}
