//! Maps a raw sensor status byte onto the named [`SensorStatusError`] variants
//! (spec §7). `OK` and `ERROR_COMMUNICATION` are handled by the command
//! engine directly and never reach this function.

use crate::constants::status as code;
use crate::error::SensorStatusError;

pub fn map_status_error(status: u8) -> Option<SensorStatusError> {
    use SensorStatusError::*;
    Some(match status {
        s if s == code::ERROR_WRONG_PASSWORD => WrongPassword,
        s if s == code::ERROR_NO_FINGER => NoFinger,
        s if s == code::ERROR_MESSY_IMAGE => MessyImage,
        s if s == code::ERROR_FEW_FEATURE_POINTS => FewFeaturePoints,
        s if s == code::ERROR_NO_TMATCHING => NoMatch,
        s if s == code::ERROR_NO_TEMPLATE_FOUND => NoTemplateFound,
        s if s == code::ERROR_CHARACTERISTICS_MISMATCH => Mismatch,
        s if s == code::ERROR_INVALID_POSITION => InvalidPosition,
        s if s == code::ERROR_LOAD_TEMPLATE => LoadTemplate,
        s if s == code::ERROR_DOWNLOAD_CHARACTERISTICS => DownloadCharacteristics,
        s if s == code::ERROR_DOWNLOAD_IMAGE => DownloadImage,
        s if s == code::ERROR_DELETE_TEMPLATE => DeleteTemplate,
        s if s == code::ERROR_CLEAR_DATABASE => ClearDatabase,
        s if s == code::ERROR_INVALID_IMAGE => InvalidImage,
        s if s == code::ERROR_FLASH => FlashWrite,
        s if s == code::ERROR_INVALID_REGISTER => InvalidRegister,
        s if s == code::ADDR_CODE => AddressWrong,
        s if s == code::PACKET_RESPONSE_FAIL => ResponseFail,
        _ => return None,
    })
}
