use bytes::Bytes;

/// Capability to turn a request or auth ticket into its canonical wire bytes.
///
/// Raw byte containers are treated as already encoded; message types from an
/// external protobuf encoder implement this to be passed in directly.
pub trait Encodable {
    fn encode_to_vec(&self) -> Vec<u8>;

    fn encode_to_bytes(&self) -> Bytes {
        Bytes::from(self.encode_to_vec())
    }
}

impl Encodable for [u8] {
    fn encode_to_vec(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl<const N: usize> Encodable for [u8; N] {
    fn encode_to_vec(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl Encodable for Vec<u8> {
    fn encode_to_vec(&self) -> Vec<u8> {
        self.clone()
    }
}

impl Encodable for Bytes {
    fn encode_to_vec(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn encode_to_bytes(&self) -> Bytes {
        self.clone()
    }
}

impl<T: Encodable + ?Sized> Encodable for &T {
    fn encode_to_vec(&self) -> Vec<u8> {
        (**self).encode_to_vec()
    }

    fn encode_to_bytes(&self) -> Bytes {
        (**self).encode_to_bytes()
    }
}
