use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Maior valor numérico aceito (14 dígitos).
pub const CNPJ_MAX: i64 = 99_999_999_999_999;

/// Maior base (12 dígitos, sem os verificadores).
pub const BASE_MAX: i64 = 999_999_999_999;

const REGION_DIVISOR: u64 = 1_000_000_000_000;
const BRANCH_MODULUS: u64 = 10_000;

const WEIGHTS_DV1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const WEIGHTS_DV2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CnpjError {
    #[error("CNPJ fora do intervalo [0, {max}]: {value}", max = CNPJ_MAX)]
    OutOfRange { value: i64 },

    #[error("elemento {index} do lote fora do intervalo [0, {max}]: {value}", max = CNPJ_MAX)]
    BatchElementOutOfRange { index: usize, value: i64 },

    #[error("base fora do intervalo [0, {max}]: {value}", max = BASE_MAX)]
    BaseOutOfRange { value: i64 },

    #[error("valor não é um inteiro válido: {input}")]
    Malformed { input: String },
}

/// CNPJ reduzido a inteiro. Sempre dentro de `[0, CNPJ_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Cnpj(u64);

impl Cnpj {
    pub fn new(value: i64) -> Result<Self, CnpjError> {
        if (0..=CNPJ_MAX).contains(&value) {
            Ok(Self(value as u64))
        } else {
            Err(CnpjError::OutOfRange { value })
        }
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn region(self) -> Region {
        let code = (self.0 / REGION_DIVISOR) as u8;
        debug_assert!(code <= Region::MAX);
        Region(code)
    }

    pub fn branch(self) -> Branch {
        Branch((self.0 % BRANCH_MODULUS) as u16)
    }

    /// Os 14 dígitos, do mais significativo ao menos, com zeros à esquerda.
    pub fn digits(self) -> [u8; 14] {
        let mut digits = [0u8; 14];
        let mut rest = self.0;
        for slot in digits.iter_mut().rev() {
            *slot = (rest % 10) as u8;
            rest /= 10;
        }
        digits
    }

    pub fn is_valid(self) -> bool {
        let digits = self.digits();
        let dv1 = check_digit(&digits[..12], &WEIGHTS_DV1);
        let dv2 = check_digit(&digits[..13], &WEIGHTS_DV2);
        dv1 == digits[12] && dv2 == digits[13]
    }

    pub fn decompose(self) -> Decomposition {
        Decomposition {
            cnpj: self,
            region: self.region(),
            branch: self.branch(),
            valid: self.is_valid(),
        }
    }

    /// `XX.XXX.XXX/XXXX-XX`
    pub fn formatted(self) -> String {
        let v = self.0;
        format!(
            "{:02}.{:03}.{:03}/{:04}-{:02}",
            v / 1_000_000_000_000,
            (v / 1_000_000_000) % 1000,
            (v / 1_000_000) % 1000,
            (v / 100) % 10_000,
            v % 100
        )
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:014}", self.0)
    }
}

/// Os dois primeiros dígitos do CNPJ, usados como chave de agrupamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Region(u8);

impl Region {
    pub const MAX: u8 = 99;

    pub fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Branch(u16);

impl Branch {
    pub fn code(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decomposition {
    pub cnpj: Cnpj,
    pub region: Region,
    pub branch: Branch,
    pub valid: bool,
}

/// Lê um inteiro vindo de fora (caminho da URL, argumento de linha de comando).
/// Não checa o intervalo: isso fica com `Cnpj::new` e `compute_check_digits`.
pub fn parse_integer(raw: &str) -> Result<i64, CnpjError> {
    raw.trim().parse::<i64>().map_err(|_| CnpjError::Malformed {
        input: raw.to_string(),
    })
}

/// Decompõe e valida um CNPJ numérico, rejeitando valores fora do intervalo.
pub fn decompose_and_validate(value: i64) -> Result<Decomposition, CnpjError> {
    Ok(Cnpj::new(value)?.decompose())
}

/// Resultado do cálculo dos dígitos verificadores de uma base de 12 dígitos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckDigits {
    pub base: u64,
    pub digits: [u8; 2],
    pub cnpj: Cnpj,
}

/// Calcula os dígitos verificadores de uma base (CNPJ sem os dois últimos dígitos).
pub fn compute_check_digits(base: i64) -> Result<CheckDigits, CnpjError> {
    if !(0..=BASE_MAX).contains(&base) {
        return Err(CnpjError::BaseOutOfRange { value: base });
    }

    let mut digits = [0u8; 13];
    let mut rest = base as u64;
    for slot in digits[..12].iter_mut().rev() {
        *slot = (rest % 10) as u8;
        rest /= 10;
    }
    let dv1 = check_digit(&digits[..12], &WEIGHTS_DV1);
    digits[12] = dv1;
    let dv2 = check_digit(&digits, &WEIGHTS_DV2);

    let full = base as u64 * 100 + u64::from(dv1) * 10 + u64::from(dv2);
    Ok(CheckDigits {
        base: base as u64,
        digits: [dv1, dv2],
        cnpj: Cnpj(full),
    })
}

fn check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(&d, &w)| u32::from(d) * w)
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => (11 - r) as u8,
    }
}
