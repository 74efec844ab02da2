// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/binary__log__types_8h.html
// https://mariadb.com/kb/en/library/resultset/#field-types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TypeId(pub(crate) u8);

impl TypeId {
    pub(crate) const NULL: TypeId = TypeId(6);

    // String: CHAR, VARCHAR, TEXT
    // Bytes: BINARY, VARBINARY, BLOB
    pub(crate) const CHAR: TypeId = TypeId(254); // or BINARY
    pub(crate) const VAR_CHAR: TypeId = TypeId(253); // or VAR_BINARY
    pub(crate) const TEXT: TypeId = TypeId(252); // or BLOB

    pub(crate) const ENUM: TypeId = TypeId(247);
    pub(crate) const SET: TypeId = TypeId(248);

    pub(crate) const TINY_BLOB: TypeId = TypeId(249);
    pub(crate) const MEDIUM_BLOB: TypeId = TypeId(250);
    pub(crate) const LONG_BLOB: TypeId = TypeId(251);

    // Numeric: TINYINT, SMALLINT, INT, BIGINT
    pub(crate) const TINY_INT: TypeId = TypeId(1);
    pub(crate) const SMALL_INT: TypeId = TypeId(2);
    pub(crate) const INT24: TypeId = TypeId(9);
    pub(crate) const INT: TypeId = TypeId(3);
    pub(crate) const BIG_INT: TypeId = TypeId(8);

    // Numeric: FLOAT, DOUBLE, DECIMAL
    pub(crate) const FLOAT: TypeId = TypeId(4);
    pub(crate) const DOUBLE: TypeId = TypeId(5);
    pub(crate) const DECIMAL: TypeId = TypeId(0);
    pub(crate) const NEWDECIMAL: TypeId = TypeId(246);

    // Date/Time: DATE, TIME, DATETIME, TIMESTAMP
    pub(crate) const DATE: TypeId = TypeId(10);
    pub(crate) const TIME: TypeId = TypeId(11);
    pub(crate) const DATETIME: TypeId = TypeId(12);
    pub(crate) const TIMESTAMP: TypeId = TypeId(7);

    pub(crate) const YEAR: TypeId = TypeId(13);
    pub(crate) const BIT: TypeId = TypeId(16);
    pub(crate) const GEOMETRY: TypeId = TypeId(255);

    pub(crate) fn is_string_like(self) -> bool {
        matches!(
            self,
            TypeId::CHAR
                | TypeId::VAR_CHAR
                | TypeId::TEXT
                | TypeId::ENUM
                | TypeId::SET
                | TypeId::TINY_BLOB
                | TypeId::MEDIUM_BLOB
                | TypeId::LONG_BLOB
                | TypeId::DECIMAL
                | TypeId::NEWDECIMAL
                | TypeId::BIT
                | TypeId::GEOMETRY
        )
    }
}

impl Default for TypeId {
    fn default() -> TypeId {
        TypeId::NULL
    }
}
