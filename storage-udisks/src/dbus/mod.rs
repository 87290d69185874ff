pub(crate) mod bytestring;
