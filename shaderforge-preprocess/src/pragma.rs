use crate::PreprocessError;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while1};
use nom::character::complete::{char, space0, space1};
use nom::combinator::{eof, map, rest, value};
use nom::sequence::{delimited, preceded, terminated, tuple};
use nom::IResult;

/// An include directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Include<'a> {
    pub(crate) path: &'a str,
    /// `#include <...>`, resolved against the library root.
    pub(crate) library: bool,
}

/// A directive controlling the stage interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InterfaceDirective {
    OverrideBegin,
    OverrideEnd,
    NoFragmentOutput,
}

/// A specialization constant declaration, `spec_const <type> <name> = <value>;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecConstDecl<'a> {
    pub(crate) ty: &'a str,
    pub(crate) name: &'a str,
    pub(crate) value: &'a str,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn line_end(input: &str) -> IResult<&str, &str> {
    preceded(space0, alt((eof, preceded(tag("//"), rest))))(input)
}

fn is_directive(line: &str, keyword: &str) -> bool {
    line.trim_start().strip_prefix(keyword).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with(['"', '<'])
    })
}

fn pragma_name(line: &str) -> Option<&str> {
    let (_, name) = preceded(
        tuple((space0, char('#'), space0, tag("pragma"), space1)),
        identifier,
    )(line)
    .ok()?;
    Some(name)
}

/// Parse an include directive. Lines that are not include directives yield `Ok(None)`.
pub(crate) fn parse_include(line: &str) -> Result<Option<Include<'_>>, PreprocessError> {
    if !is_directive(line, "#include") {
        return Ok(None);
    }

    fn parse(input: &str) -> IResult<&str, Include<'_>> {
        let (input, _) = tuple((space0, tag("#include"), space0))(input)?;
        let (input, include) = alt((
            map(delimited(char('"'), is_not("\""), char('"')), |path| Include {
                path,
                library: false,
            }),
            map(delimited(char('<'), is_not(">"), char('>')), |path| Include {
                path,
                library: true,
            }),
        ))(input)?;
        let (input, _) = line_end(input)?;
        Ok((input, include))
    }

    match parse(line) {
        Ok((_, include)) => Ok(Some(include)),
        Err(_) => Err(PreprocessError::MalformedDirective(line.trim().to_string())),
    }
}

/// Parse an interface directive. Lines that are not interface directives yield `Ok(None)`.
pub(crate) fn parse_interface_directive(
    line: &str,
) -> Result<Option<InterfaceDirective>, PreprocessError> {
    match pragma_name(line) {
        Some("no_fragment_output") => Ok(Some(InterfaceDirective::NoFragmentOutput)),
        Some("interface_override") => {
            fn parse(input: &str) -> IResult<&str, InterfaceDirective> {
                let (input, _) = tuple((
                    space0,
                    char('#'),
                    space0,
                    tag("pragma"),
                    space1,
                    tag("interface_override"),
                    space1,
                ))(input)?;
                terminated(
                    alt((
                        value(InterfaceDirective::OverrideBegin, tag("begin")),
                        value(InterfaceDirective::OverrideEnd, tag("end")),
                    )),
                    line_end,
                )(input)
            }
            parse(line)
                .map(|(_, directive)| Some(directive))
                .map_err(|_| PreprocessError::MalformedDirective(line.trim().to_string()))
        }
        _ => Ok(None),
    }
}

/// Parse a `use_resource_block` directive, returning the group name.
pub(crate) fn parse_resource_block(line: &str) -> Result<Option<&str>, PreprocessError> {
    if pragma_name(line) != Some("use_resource_block") {
        return Ok(None);
    }

    fn parse(input: &str) -> IResult<&str, &str> {
        let (input, _) = tuple((
            space0,
            char('#'),
            space0,
            tag("pragma"),
            space1,
            tag("use_resource_block"),
            space1,
        ))(input)?;
        terminated(
            alt((delimited(char('"'), is_not("\""), char('"')), identifier)),
            line_end,
        )(input)
    }

    match parse(line) {
        Ok((_, name)) => Ok(Some(name)),
        Err(_) => Err(PreprocessError::MalformedDirective(line.trim().to_string())),
    }
}

/// Parse a specialization constant declaration.
pub(crate) fn parse_spec_const(line: &str) -> Result<Option<SpecConstDecl<'_>>, PreprocessError> {
    if !is_directive(line, "spec_const") {
        return Ok(None);
    }

    fn parse(input: &str) -> IResult<&str, SpecConstDecl<'_>> {
        let (input, _) = tuple((space0, tag("spec_const"), space1))(input)?;
        let (input, ty) = terminated(identifier, space1)(input)?;
        let (input, name) = terminated(identifier, tuple((space0, char('='), space0)))(input)?;
        let (input, value) = terminated(is_not(";"), char(';'))(input)?;
        let (input, _) = line_end(input)?;
        Ok((
            input,
            SpecConstDecl {
                ty,
                name,
                value: value.trim_end(),
            },
        ))
    }

    match parse(line) {
        Ok((_, decl)) if !decl.value.is_empty() => Ok(Some(decl)),
        _ => Err(PreprocessError::MalformedDirective(line.trim().to_string())),
    }
}
