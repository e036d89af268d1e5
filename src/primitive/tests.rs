use super::*;
use crate::transport::HttpTransport;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

fn text_of(desc: &TypeDescriptor, value: &Value) -> String {
    let mut out = String::new();
    bind_text(desc, value, &HttpTransport::new(), &mut out).unwrap();
    out
}

fn bytes_of(desc: &TypeDescriptor, value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    bind_binary(desc, value, &mut out).unwrap();
    out
}

fn colors() -> TypeDescriptor {
    TypeDescriptor::Enum8(EnumMembers::new([("red", 1), ("green", 2), ("blue", -3)]))
}

#[test]
fn test_scalar_text_literals() {
    assert_eq!(text_of(&TypeDescriptor::String, &"it's".into()), "'it\\'s'");
    assert_eq!(text_of(&TypeDescriptor::Int64, &Value::Int8(-5)), "-5");
    assert_eq!(text_of(&TypeDescriptor::Float64, &Value::Float64(2.5)), "2.5");
    assert_eq!(
        text_of(
            &TypeDescriptor::Date,
            &Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        ),
        "'2024-01-31'"
    );
    assert_eq!(
        text_of(&TypeDescriptor::decimal(10, 2), &Value::Decimal(Decimal::from_str("3.14159").unwrap())),
        "3.14"
    );
    let id = Uuid::from_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    assert_eq!(
        text_of(&TypeDescriptor::Uuid, &Value::Uuid(id)),
        "'67e55044-10b1-426f-9247-bb680e5fe0c8'"
    );
    assert_eq!(text_of(&colors(), &"green".into()), "'green'");
    assert_eq!(text_of(&colors(), &Value::Int8(-3)), "'blue'");
}

#[test]
fn test_out_of_range_and_wrong_kind_fail_with_encoding() {
    let mut out = String::new();
    let http = HttpTransport::new();
    assert!(matches!(
        bind_text(&TypeDescriptor::UInt8, &Value::Int32(300), &http, &mut out),
        Err(CodecError::Encoding(_))
    ));
    assert!(matches!(
        bind_text(&TypeDescriptor::Int32, &Value::String("1".into()), &http, &mut out),
        Err(CodecError::Encoding(_))
    ));
    assert!(matches!(
        bind_binary(&TypeDescriptor::Int16, &Value::UInt64(u64::MAX), &mut Vec::new()),
        Err(CodecError::Encoding(_))
    ));
}

#[test]
fn test_epoch_range_is_checked_on_both_transports() {
    let http = HttpTransport::new();
    let before_epoch = Value::Date(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
    let last_day = Value::Date(NaiveDate::from_ymd_opt(2149, 6, 6).unwrap());
    let negative_seconds = Value::DateTime(
        chrono::DateTime::from_timestamp(-100, 0).unwrap().naive_utc(),
    );
    let datetime = TypeDescriptor::datetime(None);

    for (desc, value) in [(&TypeDescriptor::Date, &before_epoch), (&datetime, &negative_seconds)] {
        assert!(matches!(
            bind_text(desc, value, &http, &mut String::new()),
            Err(CodecError::Encoding(_))
        ));
        assert!(matches!(
            bind_binary(desc, value, &mut Vec::new()),
            Err(CodecError::Encoding(_))
        ));
    }

    assert_eq!(text_of(&TypeDescriptor::Date, &last_day), "'2149-06-06'");
    assert_eq!(bytes_of(&TypeDescriptor::Date, &last_day), u16::MAX.to_le_bytes());
}

#[test]
fn test_unknown_enum_members() {
    let mut out = String::new();
    assert!(matches!(
        bind_text(&colors(), &"purple".into(), &HttpTransport::new(), &mut out),
        Err(CodecError::UnknownEnumMember(name)) if name == "purple"
    ));
    assert!(matches!(
        bind_binary(&colors(), &Value::Int8(9), &mut Vec::new()),
        Err(CodecError::UnknownEnumMember(_))
    ));
    assert!(matches!(
        result_text(&colors(), &Literal::Quoted("purple".into())),
        Err(CodecError::UnknownEnumMember(_))
    ));
    let mut cursor = Cursor::new(&[7u8][..]);
    assert!(matches!(
        result_binary(&colors(), &mut cursor),
        Err(CodecError::UnknownEnumMember(_))
    ));
}

#[test]
fn test_enum_result_accepts_names_and_ordinals() {
    assert_eq!(
        result_text(&colors(), &Literal::Quoted("red".into())).unwrap(),
        Value::String("red".into())
    );
    assert_eq!(
        result_text(&colors(), &Literal::Token("-3".into())).unwrap(),
        Value::String("blue".into())
    );
    let mut cursor = Cursor::new(&[2u8][..]);
    assert_eq!(
        result_binary(&colors(), &mut cursor).unwrap(),
        Value::String("green".into())
    );
}

#[test]
fn test_scalar_binary_layouts() {
    assert_eq!(bytes_of(&TypeDescriptor::UInt32, &Value::UInt32(1)), vec![1, 0, 0, 0]);
    assert_eq!(bytes_of(&TypeDescriptor::String, &"ab".into()), vec![2, b'a', b'b']);
    assert_eq!(bytes_of(&colors(), &"blue".into()), vec![0xFD]);

    let id = Uuid::from_u64_pair(1, 2);
    let bytes = bytes_of(&TypeDescriptor::Uuid, &Value::Uuid(id));
    assert_eq!(&bytes[..8], &1u64.to_le_bytes());
    assert_eq!(&bytes[8..], &2u64.to_le_bytes());
    let mut cursor = Cursor::new(bytes.as_slice());
    assert_eq!(result_binary(&TypeDescriptor::Uuid, &mut cursor).unwrap(), Value::Uuid(id));
}

#[test]
fn test_result_text_scalars() {
    assert_eq!(
        result_text(&TypeDescriptor::Int32, &Literal::Token("42".into())).unwrap(),
        Value::Int32(42)
    );
    assert_eq!(
        result_text(&TypeDescriptor::UInt8, &Literal::Token("true".into())).unwrap(),
        Value::UInt8(1)
    );
    assert!(matches!(
        result_text(&TypeDescriptor::Int32, &Literal::Token("4x".into())),
        Err(CodecError::InvalidScalar { .. })
    ));
    assert!(matches!(
        result_text(&TypeDescriptor::String, &Literal::Array(vec![])),
        Err(CodecError::TypeMismatch { .. })
    ));
}

#[test]
fn test_composites_are_rejected_here() {
    let array = TypeDescriptor::array(TypeDescriptor::Int8);
    assert!(matches!(
        bind_binary(&array, &Value::Array(vec![]), &mut Vec::new()),
        Err(CodecError::InvalidType(_))
    ));
}
