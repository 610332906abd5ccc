/// Constants for binary Ion v1.0.
pub mod v1_0 {
    /// The Ion Version Marker byte sequence that introduces every binary Ion 1.0 stream.
    pub const IVM: [u8; 4] = [0xE0, 0x01, 0x00, 0xEA];

    /// Constants for interpreting the length (`L`) nibble of a type descriptor byte.
    pub mod length_codes {
        /// The value is a null of the descriptor's type.
        pub const NULL: u8 = 15;
        /// The value's length follows the type descriptor as a VarUInt.
        pub const VAR_UINT: u8 = 14;
    }
}
